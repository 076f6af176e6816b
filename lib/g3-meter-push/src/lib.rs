/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod naming;
pub use naming::{DogStatsdNamingConvention, NamingConvention};

mod escape;

mod encode;
pub use encode::{MetricEncoder, WireCall, WireOperation};

mod dispatch;
pub use dispatch::{Emission, MeterDispatcher};

mod sink;
pub use sink::MetricSink;

mod publish;
pub use publish::{DogStatsdPublisher, Publish, PublishError, PublishStats};

mod schedule;
pub use schedule::{PublishScheduler, SchedulerError};

mod config;
pub use config::PushConfig;

mod registry;
pub use registry::{DogStatsdMeterRegistry, DogStatsdMeterRegistryBuilder};
