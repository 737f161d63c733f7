use std::collections::HashMap;

use soia::{demo, Service};
use soia_core::JsonFlavor;

#[tokio::main]
async fn main() {
    soia::init_logging(log::LevelFilter::Info);
    let headers = HashMap::new();

    // Register a single method that accepts a Person and greets them.
    let service = Service::builder()
        .with_method("greet", 1, demo::person_serializer(), demo::string_serializer(), |person: demo::Person| async move {
            Ok(format!("hello, {} ({} years old)", person.name, person.age))
        })
        .unwrap()
        .build();

    let ada = demo::Person::new("ada", 36);
    let request = demo::person_serializer().to_json_code(&ada, JsonFlavor::Readable);
    println!("request json: {}", request);

    let response = service.handle_request(&format!("greet::readable:{}", request), &headers, Some(true)).await;
    println!("status {}: {}", response.status, response.body);

    // Unknown method falls back to the listing form.
    let listing = service.handle_request("list", &headers, Some(true)).await;
    println!("methods: {}", listing.body);
}
