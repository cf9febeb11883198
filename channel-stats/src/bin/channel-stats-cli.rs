use eyre::Context;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_channel_stats::{Aggregator, ChannelReport, Config, Credential, Error, VideoTable};

const USAGE: &str = "usage: channel-stats-cli <channel name>";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // stdout carries the report, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let channel_name = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if channel_name.trim().is_empty() {
        eyre::bail!(USAGE);
    }
    let credential = std::env::var("YOUTUBE_API_KEY")
        .map(Credential::from)
        .context("YOUTUBE_API_KEY must hold a YouTube Data API key")?;

    let config = Config::from_env().context("read configuration")?;
    let aggregator = Aggregator::new(config).context("build HTTP client")?;

    let pending = aggregator.spawn_aggregate(channel_name.trim(), credential);
    let abort = pending.abort_handle();
    let result = tokio::select! {
        result = pending.join() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, cancelling aggregation");
            abort.abort();
            Err(Error::Cancelled)
        }
    };
    let result = match result {
        Ok(result) => result,
        Err(Error::Remote {
            status,
            message,
            detail,
            ..
        }) => {
            let detail = detail.unwrap_or_default();
            eyre::bail!("YouTube API returned {status}: {message} {detail}");
        }
        Err(e) => return Err(e).context("aggregate channel"),
    };

    for failure in &result.failed_batches {
        tracing::warn!(
            batch = failure.index,
            videos = failure.video_ids.len(),
            error = %failure.error,
            "batch left out of the report"
        );
    }

    let table = VideoTable::from_records(&result.records);
    let report = ChannelReport::new(&result, &table);
    let json = serde_json::to_string_pretty(&report).context("serialize report")?;
    println!("{json}");

    Ok(())
}
