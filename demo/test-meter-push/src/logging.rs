/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io::{self, Write};

use chrono::Local;
use slog::{Drain, KV, Key, OwnedKVList, Record, Serializer, slog_o};
use slog_scope::GlobalLoggerGuard;

struct KvWriter<'a, IO: Write> {
    io: &'a mut IO,
}

impl<IO: Write> Serializer for KvWriter<'_, IO> {
    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments) -> slog::Result {
        write!(self.io, " {key}: {val},")?;
        Ok(())
    }
}

struct StderrDrain;

impl Drain for StderrDrain {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, values: &OwnedKVList) -> io::Result<()> {
        let mut buf = Vec::with_capacity(256);
        write!(
            buf,
            "{} {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
            record.level().as_short_str()
        )?;
        let mut kv = KvWriter { io: &mut buf };
        let _ = record.kv().serialize(record, &mut kv);
        let _ = values.serialize(record, &mut kv);
        writeln!(
            buf,
            " {} <{}:{}>",
            record.msg(),
            record.module(),
            record.line()
        )?;

        let mut stderr = io::stderr().lock();
        stderr.write_all(&buf)?;
        stderr.flush()
    }
}

pub(crate) fn setup() -> Result<GlobalLoggerGuard, log::SetLoggerError> {
    let logger = slog::Logger::root(StderrDrain.fuse(), slog_o!());
    let scope_guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init_with_level(log::Level::Debug)?;
    Ok(scope_guard)
}
