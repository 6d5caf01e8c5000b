use crate::app::Result;
use crate::bot;
use crate::config::Config;

pub async fn run(config: Config) -> Result<()> {
    println!(
        "Connecting to {} as {} ({} channels, {} feeds)",
        config.server,
        config.nick,
        config.channels.len(),
        config.feeds().count()
    );
    bot::run(config).await
}

pub fn check(config: &Config) {
    println!("Server:   {}", config.server);
    println!("Nick:     {} ({})", config.nick, config.realname());
    println!("Polling:  every {:?}", config.timing.poll_interval());

    if config.channels.is_empty() {
        println!("No channels configured");
        return;
    }
    for (channel, settings) in &config.channels {
        println!("{channel}");
        for feed in &settings.feeds {
            println!("  feed {feed}");
        }
        for host in &settings.ops {
            println!("  op   {host}");
        }
    }
}
