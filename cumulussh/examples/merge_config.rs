//! Stage a change, review the diff, then commit or roll back.
//!
//! ```sh
//! cargo run --example merge_config -- <host> <password>
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
        .sudo()
        .build();

    session.open().await?;
    println!("connected, dialect: {:?}", session.dialect());

    session
        .load_candidate(vec![
            "net add vlan 10".to_string(),
            "net add interface swp1 bridge access 10".to_string(),
        ])
        .await?;

    let diff = session.compare_candidate().await?;
    if diff.is_empty() {
        println!("candidate matches the running config, discarding");
        session.discard_candidate().await?;
    } else {
        println!("pending changes:\n{diff}");
        session.commit_candidate(false).await?;
        println!("committed");

        // Second thoughts? The last committed change can be undone.
        session.rollback().await?;
        println!("rolled back");
    }

    session.close().await?;
    Ok(())
}
