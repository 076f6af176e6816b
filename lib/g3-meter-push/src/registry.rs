/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use log::{info, warn};

use g3_meter::MeterRegistry;

use crate::{
    DogStatsdPublisher, MeterDispatcher, MetricSink, NamingConvention, Publish, PublishError,
    PublishScheduler, PublishStats, PushConfig,
};

pub struct DogStatsdMeterRegistryBuilder {
    config: PushConfig,
    sink: Option<Box<dyn MetricSink + Send>>,
    naming: Option<Arc<dyn NamingConvention>>,
    registry: Option<Arc<MeterRegistry>>,
    thread_name: Option<String>,
}

impl DogStatsdMeterRegistryBuilder {
    /// Use this sink instead of a statsd client built from the config.
    pub fn sink<S: MetricSink + Send + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn naming_convention(mut self, naming: Arc<dyn NamingConvention>) -> Self {
        self.naming = Some(naming);
        self
    }

    pub fn meter_registry(mut self, registry: Arc<MeterRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn thread_name<T: Into<String>>(mut self, name: T) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub fn build(self) -> anyhow::Result<DogStatsdMeterRegistry> {
        let config = self.config;
        config.check().context("invalid meter push config")?;

        let sink = match self.sink {
            Some(sink) => sink,
            None => {
                let client = config
                    .statsd
                    .build()
                    .context("failed to build statsd client")?;
                Box::new(client) as Box<dyn MetricSink + Send>
            }
        };
        let registry = self.registry.unwrap_or_default();

        let mut publisher = DogStatsdPublisher::new(registry.clone(), sink)
            .with_dispatcher(MeterDispatcher::with_statistic_tag(config.statistic_tag));
        if let Some(naming) = self.naming {
            publisher = publisher.with_naming(naming);
        }
        let publisher = Arc::new(publisher);

        let mut scheduler =
            PublishScheduler::new(publisher.clone()).with_align_to_step(config.align_to_step);
        if let Some(name) = self.thread_name {
            scheduler = scheduler.with_thread_name(name);
        }
        if config.enabled {
            scheduler
                .start(config.step)
                .context("failed to start publish scheduler")?;
            info!("publishing metrics for DogStatsD every {:?}", config.step);
        }

        Ok(DogStatsdMeterRegistry {
            config,
            registry,
            publisher,
            scheduler,
            closed: AtomicBool::new(false),
        })
    }
}

/// A meter registry whose meters are pushed to DogStatsD at every step.
pub struct DogStatsdMeterRegistry {
    config: PushConfig,
    registry: Arc<MeterRegistry>,
    publisher: Arc<DogStatsdPublisher>,
    scheduler: PublishScheduler,
    closed: AtomicBool,
}

impl DogStatsdMeterRegistry {
    pub fn builder(config: PushConfig) -> DogStatsdMeterRegistryBuilder {
        DogStatsdMeterRegistryBuilder {
            config,
            sink: None,
            naming: None,
            registry: None,
            thread_name: None,
        }
    }

    pub fn new(config: PushConfig) -> anyhow::Result<Self> {
        DogStatsdMeterRegistry::builder(config).build()
    }

    #[inline]
    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &Arc<MeterRegistry> {
        &self.registry
    }

    /// Run a publish pass now, even if the registry is not enabled.
    pub fn publish(&self) -> Result<PublishStats, PublishError> {
        self.publisher.publish()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop the scheduler, then publish the last step if enabled.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.scheduler.stop();
        if self.config.enabled
            && let Err(e) = self.publisher.publish()
        {
            warn!("final publish pass: {e}");
        }
        if let Err(e) = self.publisher.close_sink() {
            warn!("failed to close metric sink: {e}");
        }
        info!("meter registry closed");
    }
}

impl Drop for DogStatsdMeterRegistry {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::recording::RecordingSink;
    use g3_meter::{MeterId, MeterTags, MeterType};
    use std::time::Duration;

    fn config(enabled: bool) -> PushConfig {
        let mut config = PushConfig::default().with_step(Duration::from_millis(10));
        config.enabled = enabled;
        config.align_to_step = false;
        config
    }

    #[test]
    fn disabled() {
        let sink = RecordingSink::default();
        let registry = DogStatsdMeterRegistry::builder(config(false))
            .sink(sink.clone())
            .build()
            .unwrap();
        assert!(!registry.is_running());

        let id = MeterId::new("my.counter#abc", MeterType::Counter)
            .with_base_unit("microseconds")
            .with_description("metric description");
        let counter = registry.registry().counter(id).unwrap();
        counter.increment_by(std::f64::consts::PI);
        registry.publish().unwrap();
        let calls = sink.take();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "my.counter#abc.count");

        registry.close();
        assert!(registry.is_closed());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn enabled_final_publish() {
        let sink = RecordingSink::default();
        let shared = Arc::new(MeterRegistry::new());
        let registry = DogStatsdMeterRegistry::builder(config(true))
            .sink(sink.clone())
            .meter_registry(shared.clone())
            .thread_name("test-meter-push")
            .build()
            .unwrap();
        assert!(registry.is_running());

        let gauge = shared
            .gauge(
                MeterId::new("manual_gauge_example", MeterType::Gauge)
                    .with_tags(MeterTags::new().with("env", "dev")),
            )
            .unwrap();
        gauge.set(42.0);

        let start = std::time::Instant::now();
        while sink.take().is_empty() {
            assert!(start.elapsed() < Duration::from_secs(10));
            std::thread::sleep(Duration::from_millis(1));
        }

        registry.close();
        assert!(!registry.is_running());
        let calls = sink.take();
        assert!(!calls.is_empty());
        assert_eq!(calls.last().unwrap().value, 42.0);
        assert_eq!(calls.last().unwrap().tags, vec!["env:dev"]);

        registry.close();
        assert!(sink.take().is_empty());
    }

    #[test]
    fn invalid_config() {
        let r = DogStatsdMeterRegistry::builder(config(true).with_step(Duration::ZERO))
            .sink(RecordingSink::default())
            .build();
        assert!(r.is_err());
    }
}
