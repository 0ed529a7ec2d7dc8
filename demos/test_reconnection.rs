use realtime_notify::{NotificationClient, NotifierOptions};
use std::time::Duration;

/// Exercise reconnection against a real notification server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to see logs
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Testing reconnection\n");

    let url = std::env::var("NOTIFY_URL").expect("NOTIFY_URL must be set in .env");
    let token = std::env::var("NOTIFY_TOKEN").expect("NOTIFY_TOKEN must be set in .env");

    println!("Connecting to: {}\n", url);

    let client = NotificationClient::new(&url, NotifierOptions::default())?;
    let _changes = client.on_connection_change(|connected| {
        println!("\nConnection changed: {}", if connected { "up" } else { "down" });
    });

    // Test 1: Connect and verify
    println!("Test 1: Initial connection...");
    client.connect(token.as_str()).await?;
    assert!(client.is_connected().await, "Should be connected");
    println!("Connected successfully!\n");

    tokio::time::sleep(Duration::from_secs(2)).await;

    // Test 2: Manual disconnect should NOT trigger reconnection
    println!("Test 2: Manual disconnect (should NOT auto-reconnect)...");
    client.disconnect().await?;
    assert!(!client.is_connected().await, "Should be disconnected");

    println!("Waiting 5 seconds to verify no auto-reconnect...");
    tokio::time::sleep(Duration::from_secs(5)).await;

    if client.is_connected().await {
        return Err("Should NOT reconnect after manual disconnect".into());
    }
    println!("Correctly stayed disconnected after manual disconnect!\n");

    // Test 3: Reconnect, then watch for drops
    println!("Test 3: Automatic reconnection...");
    client.connect(token.as_str()).await?;
    assert!(client.is_connected().await, "Should be connected again");

    println!("Restart the server or interrupt your network to trigger a reconnect.");
    println!("Watching status for 60 seconds...\n");

    for i in 1..=60 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        print!(
            "\rSecond {}/60 - Status: {} (attempts: {})",
            i,
            client.status().await,
            client.reconnect_attempts().await
        );
        std::io::Write::flush(&mut std::io::stdout())?;
    }
    println!("\n");

    println!("Final status: {}", client.status().await);
    client.disconnect().await?;

    Ok(())
}
