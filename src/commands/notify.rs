//! CLI client commands for a running notification daemon.

use super::CommandResult;
use color_notify::daemon::dbus::{BUS_NAME, OBJECT_PATH};

/// Helper to create a D-Bus proxy for the notify daemon.
async fn light_proxy() -> Result<zbus::Proxy<'static>, Box<dyn std::error::Error>> {
    let conn = zbus::Connection::session().await?;
    let proxy = zbus::Proxy::new_owned(conn, BUS_NAME, OBJECT_PATH, BUS_NAME).await?;
    Ok(proxy)
}

/// Turn a notification on via D-Bus.
pub async fn notify(
    id: &str,
    pattern: Option<&str>,
    pattern_json: Option<&str>,
    priority: Option<i32>,
    expire_ms: Option<i64>,
) -> CommandResult {
    let proxy = light_proxy().await?;
    let priority = priority.unwrap_or(-1);
    let expire_ms = expire_ms.unwrap_or(-1);

    if let Some(json) = pattern_json {
        proxy
            .call_method("NotifyPattern", &(id, json, priority, expire_ms))
            .await?;
        println!("Notification {id} posted (inline pattern).");
    } else {
        let pattern = pattern.unwrap_or("solid");
        proxy
            .call_method("Notify", &(id, pattern, priority, expire_ms))
            .await?;
        println!("Notification {id} posted ({pattern}).");
    }
    Ok(())
}

/// Turn a notification off via D-Bus.
pub async fn off(id: &str) -> CommandResult {
    let proxy = light_proxy().await?;
    proxy.call_method("TurnOff", &(id,)).await?;
    println!("Notification {id} turned off.");
    Ok(())
}

/// List active notifications via D-Bus.
pub async fn list() -> CommandResult {
    let proxy = light_proxy().await?;

    let reply = proxy.call_method("List", &()).await?;
    let items: Vec<(String, String, i32)> = reply.body().deserialize()?;

    if items.is_empty() {
        println!("No active notifications.");
    } else {
        println!("{:<16} {:<16} {:<8}", "ID", "Pattern", "Priority");
        println!("{}", "-".repeat(42));
        for (id, pattern, priority) in &items {
            println!("{:<16} {:<16} {:<8}", id, pattern, priority);
        }
    }
    Ok(())
}

/// Clear all notifications via D-Bus.
pub async fn clear() -> CommandResult {
    let proxy = light_proxy().await?;
    proxy.call_method("Clear", &()).await?;
    println!("All notifications cleared.");
    Ok(())
}

/// Rotate the top-priority tier via D-Bus.
pub async fn cycle() -> CommandResult {
    let proxy = light_proxy().await?;
    proxy.call_method("Cycle", &()).await?;
    Ok(())
}

/// Turn the wrapped light itself on.
pub async fn light_on() -> CommandResult {
    let proxy = light_proxy().await?;
    proxy.call_method("LightOn", &()).await?;
    println!("Light turned on.");
    Ok(())
}

/// Turn the wrapped light itself off.
pub async fn light_off() -> CommandResult {
    let proxy = light_proxy().await?;
    proxy.call_method("LightOff", &()).await?;
    println!("Light turned off.");
    Ok(())
}
