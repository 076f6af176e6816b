/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{SocketAddr, UdpSocket};
#[cfg(unix)]
use std::os::unix::net::UnixDatagram;
#[cfg(unix)]
use std::path::PathBuf;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
mod buf;
#[cfg(test)]
use buf::BufMetricsSink;

mod udp;
use udp::UdpMetricsSink;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix::UnixMetricsSink;

enum MetricsSinkIo {
    #[cfg(test)]
    Buf(BufMetricsSink),
    Udp(UdpMetricsSink),
    #[cfg(unix)]
    Unix(UnixMetricsSink),
}

impl MetricsSinkIo {
    fn send_msg(&self, msg: &[u8]) -> io::Result<usize> {
        match self {
            #[cfg(test)]
            MetricsSinkIo::Buf(b) => b.send_msg(msg),
            MetricsSinkIo::Udp(s) => s.send_msg(msg),
            #[cfg(unix)]
            MetricsSinkIo::Unix(s) => s.send_msg(msg),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SinkStats {
    pub(crate) packets_sent: u64,
    pub(crate) bytes_sent: u64,
    pub(crate) packets_dropped: u64,
}

/// Join metric lines into packets no larger than `max_packet_size`.
pub(crate) struct StatsdMetricsSink {
    max_packet_size: usize,
    buf: Vec<u8>,
    io: MetricsSinkIo,
    stats: SinkStats,
}

impl StatsdMetricsSink {
    fn new(io: MetricsSinkIo, max_packet_size: usize) -> Self {
        StatsdMetricsSink {
            max_packet_size,
            buf: Vec::with_capacity(max_packet_size),
            io,
            stats: SinkStats::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn buf_with_capacity(buf: Arc<Mutex<Vec<u8>>>, max_packet_size: usize) -> Self {
        StatsdMetricsSink::new(MetricsSinkIo::Buf(BufMetricsSink::new(buf)), max_packet_size)
    }

    pub(crate) fn udp_with_capacity(
        addr: SocketAddr,
        socket: UdpSocket,
        max_packet_size: usize,
    ) -> Self {
        StatsdMetricsSink::new(
            MetricsSinkIo::Udp(UdpMetricsSink::new(addr, socket)),
            max_packet_size,
        )
    }

    #[cfg(unix)]
    pub(crate) fn unix_with_capacity(
        path: PathBuf,
        socket: UnixDatagram,
        max_packet_size: usize,
    ) -> Self {
        StatsdMetricsSink::new(
            MetricsSinkIo::Unix(UnixMetricsSink::new(path, socket)),
            max_packet_size,
        )
    }

    /// Append one line, sending the pending packet first if the line would not fit.
    ///
    /// The line is kept even if sending the previous packet failed.
    pub(crate) fn emit(&mut self, line: &[u8]) -> io::Result<()> {
        let mut r = Ok(());
        if !self.buf.is_empty() && self.buf.len() + 1 + line.len() > self.max_packet_size {
            r = self.flush_buf();
        }
        if !self.buf.is_empty() {
            self.buf.push(b'\n');
        }
        self.buf.extend_from_slice(line);
        r
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        let r = self.io.send_msg(&self.buf);
        match &r {
            Ok(nw) => {
                self.stats.packets_sent += 1;
                self.stats.bytes_sent += *nw as u64;
            }
            Err(_) => self.stats.packets_dropped += 1,
        }
        self.buf.clear();
        r.map(|_| ())
    }

    pub(crate) fn take_stats(&mut self) -> SinkStats {
        std::mem::take(&mut self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_lines() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut sink = StatsdMetricsSink::buf_with_capacity(buf.clone(), 32);
        sink.emit(b"a:1|c").unwrap();
        sink.emit(b"b:2|g").unwrap();
        assert!(buf.lock().unwrap().is_empty());
        sink.flush().unwrap();
        assert_eq!(buf.lock().unwrap().as_slice(), b"a:1|c\nb:2|g");

        let stats = sink.take_stats();
        assert_eq!(stats.packets_sent, 1);
        assert_eq!(stats.bytes_sent, 11);
        assert_eq!(sink.take_stats(), SinkStats::default());
    }

    #[test]
    fn split_packets() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut sink = StatsdMetricsSink::buf_with_capacity(buf.clone(), 10);
        sink.emit(b"a:1|c").unwrap();
        sink.emit(b"b:2|c").unwrap();
        // the first packet has been sent without the second line
        assert_eq!(buf.lock().unwrap().as_slice(), b"a:1|c");
        sink.emit(b"a_very_long_name:1|c").unwrap();
        sink.flush().unwrap();
        assert_eq!(
            buf.lock().unwrap().as_slice(),
            b"a:1|cb:2|ca_very_long_name:1|c"
        );
        assert_eq!(sink.take_stats().packets_sent, 3);
    }

    #[test]
    fn flush_empty() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut sink = StatsdMetricsSink::buf_with_capacity(buf.clone(), 10);
        sink.flush().unwrap();
        assert_eq!(sink.take_stats().packets_sent, 0);
    }
}
