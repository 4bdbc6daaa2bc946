use basedrop::Collector;
use sfx_engine::{
    engine::{self, EngineOpts},
    player::SfxPlayer,
    preset::PresetTable,
    processor::AudioOutput,
};
use std::{
    io::BufRead,
    sync::mpsc::{self, RecvTimeoutError},
    time::{Duration, Instant},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How long the control loop sleeps when no teardown is pending.
const IDLE_WAIT: Duration = Duration::from_millis(250);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    engine::silence_panics_while_rendering();

    // Create the output stream
    let collector = Collector::new();
    let (output, controller) = match AudioOutput::from_default_device(EngineOpts::default(), &collector.handle()) {
        Ok(output) => output,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };
    let mut player = SfxPlayer::new(controller, collector, PresetTable::builtin());

    // Read commands from stdin on a separate thread
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let names: Vec<&str> = player.presets().names().collect();
    info!("Type a preset name to play it ({}), or list, stop, quit", names.join(", "));

    // Control loop
    loop {
        let timeout = player
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_WAIT);

        match rx.recv_timeout(timeout) {
            Ok(line) => match line.trim() {
                "" => {}
                "quit" => break,
                "list" => {
                    for name in player.presets().names() {
                        println!("{}", name);
                    }
                }
                "stop" => player.stop_all(),
                name => {
                    if let Err(err) = player.trigger(name) {
                        error!("{}", err);
                    }
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        player.update(Instant::now());
        if !output.is_running() {
            error!("Audio output stopped");
            break;
        }
    }

    // Let the remaining effects play out
    while let Some(deadline) = player.next_deadline() {
        if !output.is_running() {
            break;
        }
        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        player.update(Instant::now());
    }

    // Stop the stream first so the collector can reclaim whatever the graph still holds
    drop(output);
    player.stop_all();
}
