// src/main.rs
//! Relays stdin lines through the collector and prints what the host receives

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use console_relay::{
    Arg, ChannelTransport, Collector, CollectorConfig, HostMessage, LogLevel, RelayLogger,
    install_panic_hook,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "console-relay", version, about = "Collect log lines and relay them in batches to a host")]
struct Cli {
    /// Path to a TOML config file (defaults to <config dir>/console-relay/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Level recorded for each input line
    #[arg(short, long, default_value = "log")]
    level: LogLevel,

    /// Delay in milliseconds before the host reports ready; 0 means ready at startup
    #[arg(long, default_value_t = 0)]
    ready_after: u64,

    /// Record lines that parse as JSON as structured values
    #[arg(long)]
    json: bool,

    /// Also mirror each line to the console with its origin
    #[arg(long)]
    echo: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum)]
    completions: Option<Shell>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "console-relay", &mut std::io::stdout());
        return Ok(());
    }

    let config = CollectorConfig::load(cli.config.as_deref())?;
    let (transport, mut host_rx) = ChannelTransport::pair();
    let collector = Collector::builder(transport)
        .config(config)
        .ready(cli.ready_after == 0)
        .build();

    RelayLogger::init(collector.clone(), log::LevelFilter::Debug)?;
    install_panic_hook(collector.clone());

    let ready_task = (cli.ready_after > 0).then(|| {
        let collector = collector.clone();
        let delay = Duration::from_millis(cli.ready_after);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            collector.set_transport_ready();
        })
    });

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let arg = if cli.json {
                    serde_json::from_str::<serde_json::Value>(&line)
                        .map(Arg::from)
                        .unwrap_or_else(|_| Arg::from(line))
                } else {
                    Arg::from(line)
                };
                relay(&collector, cli.level, arg, cli.echo);
            }
            Some(message) = host_rx.recv() => {
                write_host_message(&mut stdout, message).await?;
            }
        }
    }

    if let Some(task) = ready_task {
        task.await?;
    }
    if let Err(e) = collector.flush().await {
        log::error!("final flush failed: {e}");
    }
    while let Ok(message) = host_rx.try_recv() {
        write_host_message(&mut stdout, message).await?;
    }

    let stats = collector.get_stats();
    log::info!("relayed session: {}", serde_json::to_string(&stats)?);
    Ok(())
}

fn relay(collector: &Collector, level: LogLevel, arg: Arg, echo: bool) {
    if !echo {
        collector.record(level, vec![arg]);
        return;
    }
    match level {
        LogLevel::Log => collector.log(vec![arg]),
        LogLevel::Info => collector.info(vec![arg]),
        LogLevel::Warn => collector.warn(vec![arg]),
        LogLevel::Error => collector.error(vec![arg]),
        LogLevel::Debug => collector.debug(vec![arg]),
    }
}

async fn write_host_message(
    stdout: &mut tokio::io::Stdout,
    message: HostMessage,
) -> std::io::Result<()> {
    match message {
        HostMessage::Append(lines) => {
            for line in lines {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            stdout.flush().await
        }
        HostMessage::Reset => {
            log::info!("host log reset");
            Ok(())
        }
    }
}
