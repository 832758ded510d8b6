use envelope_errors::{Dispatcher, Failure, Result, TracingSink, definitions, field_errors};

fn load_profile(user_id: u64) -> Result<String> {
    // Simulate a storage failure nobody classified
    if user_id == 42 {
        return Err(Failure::from_error(std::io::Error::other(
            "profiles.db: database disk image is malformed",
        ))
        .with_operation("load_profile")
        .with_metadata("user_id", user_id.to_string()));
    }
    Ok(format!("user-{}", user_id))
}

fn change_email(email: &str) -> Result<()> {
    if !email.contains('@') {
        return Err(Failure::validation(field_errors! {
            "email" => &definitions::VALIDATION_INVALID_EMAIL,
        }));
    }
    Ok(())
}

fn main() {
    // Failures the dispatcher logs go through tracing
    tracing_subscriber::fmt().with_target(true).init();

    let dispatcher = Dispatcher::with_sink(TracingSink);

    println!("--- Basic Usage Example ---\n");

    match load_profile(42) {
        Ok(name) => println!("Loaded {}", name),
        Err(failure) => {
            // SCENARIO 1: The client
            // Only the generic server code reaches the wire.
            let response = dispatcher.dispatch(&failure);
            println!("1. [WIRE RESPONSE] status {}", response.status());
            match response.to_json() {
                Ok(body) => println!("   {}", body),
                Err(e) => println!("   unserializable body: {}", e),
            }

            // SCENARIO 2: The operator
            // The tracing line above carries the operation, the io error and the user id.
            println!("\n2. [DISPLAY] what a generic error page may show:");
            println!("   \"{}\"", failure);
        }
    }

    println!();

    if let Err(failure) = change_email("not-an-email") {
        let response = dispatcher.dispatch(&failure);
        println!("3. [VALIDATION] status {}", response.status());
        if let Ok(body) = response.to_json() {
            println!("   {}", body);
        }
    }
}
