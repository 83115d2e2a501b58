use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Notify;

use simlog::config::Config;
use simlog::log::{LogEntry, LogLevel, Logger};
use simlog::logging;

/// Minimal producer: a point walking between waypoints, tracing every tick
struct DemoRobot {
    x: f64,
    y: f64,
    waypoints: Vec<(f64, f64)>,
    next: usize,
    logger: Logger,
}

impl DemoRobot {
    fn new(logger: Logger) -> Self {
        Self {
            x: 100.0,
            y: 100.0,
            waypoints: vec![(150.0, 100.0), (150.0, 140.0), (100.0, 100.0)],
            next: 0,
            logger,
        }
    }

    fn tick(&mut self) {
        let (tx, ty) = self.waypoints[self.next];
        let (dx, dy) = (tx - self.x, ty - self.y);
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < 0.5 {
            self.logger.info(format!("Reached waypoint ({:.0}, {:.0})", tx, ty));
            self.next = (self.next + 1) % self.waypoints.len();
            return;
        }

        let step = distance.min(1.0);
        self.x += dx / distance * step;
        self.y += dy / distance * step;
        self.logger.debug(format!("Robot at ({:.2}, {:.2})", self.x, self.y));
    }
}

fn render(entries: &[LogEntry], min_level: LogLevel) -> String {
    entries
        .iter()
        .filter(|entry| entry.level() >= min_level)
        .map(|entry| entry.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let source = Arc::new(config.build_source()?);

    // Initialize tracing BEFORE any tracing calls
    logging::init_tracing(Arc::clone(&source), &config.log_filter)?;
    tracing::info!(
        queue_length = config.queue_length,
        retention_ms = ?config.retention_ms,
        "Log source ready"
    );

    // Viewer re-reads the log whenever it changes
    let changed = Arc::new(Notify::new());
    let subscription = {
        let changed = Arc::clone(&changed);
        source.subscribe(Arc::new(move || changed.notify_one()))
    };

    let viewer = {
        let source = Arc::clone(&source);
        let changed = Arc::clone(&changed);
        let min_level = config.viewer_level;
        tokio::spawn(async move {
            let mut refreshes = 0u64;
            loop {
                changed.notified().await;
                refreshes += 1;
                let entries = source.all();
                if let Some(latest) = entries.iter().rev().find(|e| e.level() >= min_level) {
                    println!("{:>4} entries | {}", entries.len(), latest);
                }
                if entries.iter().any(|e| e.message() == "Simulation finished") {
                    return refreshes;
                }
            }
        })
    };

    let mut robot = DemoRobot::new(Logger::new(Arc::clone(&source)));
    let mut interval = tokio::time::interval(config.tick_interval());
    for _ in 0..config.ticks {
        interval.tick().await;
        robot.tick();
    }
    Logger::new(Arc::clone(&source)).info("Simulation finished");

    let refreshes = viewer.await?;
    drop(subscription);

    println!("--- final log ({} refreshes) ---", refreshes);
    println!("{}", render(&source.all(), config.viewer_level));
    Ok(())
}
