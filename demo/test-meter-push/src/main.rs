/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgMatches, Command, value_parser};
use flume::RecvTimeoutError;
use log::{info, warn};

use g3_meter::{Gauge, MeterId, MeterTags, MeterType};
use g3_meter_push::{DogStatsdMeterRegistry, PushConfig};
use g3_statsd_client::StatsdBackend;

mod logging;

const ARG_CONFIG: &str = "config";
const ARG_STEP: &str = "step";
const ARG_TARGET: &str = "target";
const ARG_RUN_TIME: &str = "run-time";

const DEFAULT_DEMO_STEP: Duration = Duration::from_secs(5);

fn parse_duration(s: &str) -> Result<Duration, String> {
    humanize_rs::duration::parse(s).map_err(|e| format!("invalid duration {s}: {e}"))
}

fn build_args() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .arg(
            Arg::new(ARG_CONFIG)
                .help("YAML config file for the meter registry")
                .long(ARG_CONFIG)
                .short('c')
                .num_args(1)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_STEP)
                .help("Publish step, like 5s")
                .long(ARG_STEP)
                .num_args(1)
                .value_parser(parse_duration),
        )
        .arg(
            Arg::new(ARG_TARGET)
                .help("DogStatsD UDP address")
                .long(ARG_TARGET)
                .num_args(1)
                .value_parser(value_parser!(SocketAddr)),
        )
        .arg(
            Arg::new(ARG_RUN_TIME)
                .help("How long to run before close")
                .long(ARG_RUN_TIME)
                .num_args(1)
                .default_value("30s")
                .value_parser(parse_duration),
        )
}

fn build_config(args: &ArgMatches) -> anyhow::Result<PushConfig> {
    let mut config = match args.get_one::<PathBuf>(ARG_CONFIG) {
        Some(path) => {
            let doc = g3_yaml::load_doc(path)?;
            PushConfig::parse_yaml(&doc)
                .context(format!("invalid config file {}", path.display()))?
        }
        None => PushConfig::default().with_step(DEFAULT_DEMO_STEP),
    };
    if let Some(step) = args.get_one::<Duration>(ARG_STEP) {
        config.step = *step;
    }
    if let Some(addr) = args.get_one::<SocketAddr>(ARG_TARGET) {
        config.statsd.set_backend(StatsdBackend::Udp(*addr, None));
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let _log_guard = logging::setup().map_err(|e| anyhow!("failed to setup logger: {e}"))?;

    let args = build_args().get_matches();
    let config = build_config(&args)?;
    let run_time = args
        .get_one::<Duration>(ARG_RUN_TIME)
        .copied()
        .unwrap_or(Duration::from_secs(30));

    let registry = DogStatsdMeterRegistry::new(config).context("failed to create meter registry")?;
    let meters = registry.registry();
    let tags = MeterTags::new().with("env", "dev");

    let counter = meters.counter(
        MeterId::new("counter_example", MeterType::Counter)
            .with_tags(tags.clone())
            .with_description("a description of what this counter does"),
    )?;
    counter.increment();
    counter.increment_by(2.0);

    let summary = meters.summary(
        MeterId::new("summary_example", MeterType::DistributionSummary)
            .with_tags(tags.clone())
            .with_description("a description of what this summary does"),
    )?;
    summary.record(10.0);
    summary.record(20.0);
    summary.record(30.0);

    let cache: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::with_capacity(4)));
    meters.register(Arc::new(Gauge::with_weak(
        MeterId::new("cache_size_gauge_example", MeterType::Gauge).with_tags(tags.clone()),
        Arc::downgrade(&cache),
        |c| c.lock().map(|v| v.len() as f64).unwrap_or(f64::NAN),
    )))?;
    if let Ok(mut c) = cache.lock() {
        c.push("1".to_string());
    }

    let map: Arc<Mutex<HashMap<String, i32>>> = Arc::new(Mutex::new(HashMap::new()));
    meters.register(Arc::new(Gauge::with_weak(
        MeterId::new("map_gauge_example", MeterType::Gauge).with_tags(tags.clone()),
        Arc::downgrade(&map),
        |m| m.lock().map(|v| v.len() as f64).unwrap_or(f64::NAN),
    )))?;
    if let Ok(mut m) = map.lock() {
        m.insert("key".to_string(), 1);
    }

    let manual_gauge = meters.gauge(MeterId::new("manual_gauge_example", MeterType::Gauge))?;
    manual_gauge.set(83.0);

    let timer = meters.timer(
        MeterId::new("timer_example", MeterType::Timer)
            .with_tags(tags)
            .with_description("a description of what this timer does"),
    )?;
    timer.record(Duration::from_millis(1500));
    timer.record_fn(|| std::thread::sleep(Duration::from_millis(1500)));

    let (quit_sender, quit_receiver) = flume::bounded::<()>(1);
    let worker = std::thread::Builder::new()
        .name("demo-worker".to_string())
        .spawn(move || {
            loop {
                counter.increment();
                manual_gauge.set(42.0);
                summary.record(10.0);

                match quit_receiver.recv_timeout(Duration::from_millis(1500)) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
            }
        })
        .map_err(|e| anyhow!("failed to spawn worker thread: {e:?}"))?;

    info!("running for {run_time:?}");
    std::thread::sleep(run_time);

    let _ = quit_sender.send(());
    if worker.join().is_err() {
        warn!("worker thread panicked");
    }
    registry.close();
    drop(cache);
    drop(map);
    Ok(())
}
