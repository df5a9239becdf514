//! Read-only device state: interfaces, ARP table, environment.
//!
//! ```sh
//! cargo run --example show_state -- <host> <password>
//! ```

use cumulussh::SessionBuilder;

#[tokio::main]
async fn main() -> Result<(), cumulussh::Error> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "192.168.0.1".to_string());
    let password = args.next().unwrap_or_else(|| "CumulusLinux!".to_string());

    let mut session = SessionBuilder::new(host)
        .username("cumulus")
        .password(password)
        .build();

    session.open().await?;

    for (name, iface) in session.interfaces().await? {
        println!(
            "{name}: up={} speed={}Mb mtu={} {}",
            iface.is_up, iface.speed_mb, iface.mtu, iface.description
        );
    }

    for entry in session.arp_table().await? {
        println!("{} -> {} ({})", entry.ip, entry.mac, entry.interface);
    }

    let env = session.environment().await?;
    for (name, temp) in &env.temperature {
        println!("{name}: {}C alert={}", temp.celsius, temp.is_alert);
    }

    session.close().await?;
    Ok(())
}
