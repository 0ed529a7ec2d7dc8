use realtime_notify::{NotificationClient, NotifierOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Create client
    let client = NotificationClient::new(
        "wss://api.example.com/ws/notifications",
        NotifierOptions::default(),
    )?;

    let _notifications = client.on_notification(|n| {
        println!("[{}] {}: {}", n.kind, n.title, n.message);
    });

    // Connect
    println!("Connecting to notification server...");
    client.connect("your-token").await?;
    println!("Connected!");

    // Keep connection alive
    tokio::signal::ctrl_c().await?;

    // Disconnect
    println!("Disconnecting...");
    client.disconnect().await?;
    println!("Disconnected!");

    Ok(())
}
