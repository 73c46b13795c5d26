// examples/fetch_recommendations.rs
//
// READNEXT_API_URL=http://localhost:8000 \
// READNEXT_USERNAME=alice READNEXT_PASSWORD=s3cret \
// cargo run --example fetch_recommendations

use std::time::Duration;

use anyhow::Result;

use readnext_connector::{init_logger, ClientConfig, ReadNext, RequestQueue};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger("info");

    let client = ReadNext::new(ClientConfig::from_env())?;
    client.on_auth_failure(|| eprintln!("session expired, please log in again"));

    let username = std::env::var("READNEXT_USERNAME").expect("READNEXT_USERNAME must be set");
    let password = std::env::var("READNEXT_PASSWORD").expect("READNEXT_PASSWORD must be set");
    client.login(&username, &password).await?;

    println!("health: {}", client.health().await?);

    let recommendations = client.recommendations(&username, Some(10)).await?;
    println!("{recommendations:#}");

    // Bulk fetch for several users, at most 3 requests in flight.
    let users: Vec<String> = vec!["alice".into(), "bob".into(), "carol".into()];
    let queue = RequestQueue::new(3, Duration::from_millis(100));
    for (user, result) in users
        .iter()
        .zip(client.recommendations_bulk(&users, Some(5), &queue).await)
    {
        match result {
            Ok(payload) => println!("{user}: {payload}"),
            Err(err) => eprintln!("{user}: {err}"),
        }
    }

    Ok(())
}
