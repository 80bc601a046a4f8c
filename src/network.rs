// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! A packet-switched network of interpreters
//!
//! Each node runs a copy of the same program on its own thread, talking to the network through a
//! network interface card (NIC):
//!
//! * On boot, the first value the program reads is its own address.
//! * Reading afterwards yields the `x` and `y` of each packet addressed to the node, in order. If
//!   nothing has arrived within the idle backoff, the read yields `-1` instead.
//! * Every 3 values the program writes are sent as a packet: destination, then `x`, then `y`.
//!
//! A router thread forwards packets to nodes by address. Packets for any other address are
//! delivered to the owner of the [`Network`].

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{InterpreterError, IoError};
use crate::io::{IntReader, IntWriter};
use crate::Interpreter;

/// A packet traveling through the network
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Packet {
    /// address of the receiving node
    pub dest: i64,
    /// first value of the payload
    pub x: i64,
    /// second value of the payload
    pub y: i64,
}

/// Timing of a [`Network`]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NetworkConfig {
    /// How long a NIC waits for a packet before yielding `-1`
    pub idle_backoff: Duration,
    /// How long the router must go without traffic before the network counts as idle
    pub idle_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            idle_backoff: Duration::from_millis(10),
            idle_timeout: Duration::from_millis(100),
        }
    }
}

/// State shared by the router, the NICs, and the [`Network`] handle
#[derive(Debug)]
struct Shared {
    epoch: Instant,
    /// nanoseconds after `epoch` of the last packet through the router
    last_activity: AtomicU64,
    shutdown: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last_activity: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    fn touch(&self) {
        let nanos = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.last_activity.store(nanos, Ordering::Relaxed);
    }

    fn last_activity(&self) -> Instant {
        self.epoch + Duration::from_nanos(self.last_activity.load(Ordering::Relaxed))
    }

    fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// The receiving half of a NIC, read by a node's `IN` instructions
#[derive(Debug)]
pub struct NicReader {
    address: i64,
    pending: VecDeque<i64>,
    inbox: Receiver<Packet>,
    backoff: Duration,
    shared: Arc<Shared>,
}

/// The sending half of a NIC, written by a node's `OUT` instructions
#[derive(Debug)]
pub struct NicWriter {
    address: i64,
    partial: Vec<i64>,
    outbox: Sender<Packet>,
    shared: Arc<Shared>,
}

impl IntReader for NicReader {
    fn read_int(&mut self) -> Result<i64, IoError> {
        if let Some(value) = self.pending.pop_front() {
            return Ok(value);
        }
        if self.shared.is_shut_down() {
            return Err(IoError::EndOfStream);
        }
        match self.inbox.recv_timeout(self.backoff) {
            Ok(packet) => {
                log::debug!("[{}] RECV: {packet:?}", self.address);
                self.pending.push_back(packet.y);
                Ok(packet.x)
            }
            Err(RecvTimeoutError::Timeout) => Ok(-1),
            Err(RecvTimeoutError::Disconnected) => Err(IoError::EndOfStream),
        }
    }
}

impl IntWriter for NicWriter {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        if self.shared.is_shut_down() {
            return Err(IoError::Disconnected);
        }
        self.partial.push(value);
        if let &[dest, x, y] = self.partial.as_slice() {
            self.partial.clear();
            let packet = Packet { dest, x, y };
            log::debug!("[{}] SEND: {packet:?}", self.address);
            self.outbox.send(packet).map_err(|_| IoError::Disconnected)?;
        }
        Ok(())
    }
}

fn nic(
    address: i64,
    inbox: Receiver<Packet>,
    outbox: Sender<Packet>,
    backoff: Duration,
    shared: Arc<Shared>,
) -> (NicReader, NicWriter) {
    let reader = NicReader {
        address,
        pending: VecDeque::from([address]),
        inbox,
        backoff,
        shared: Arc::clone(&shared),
    };
    let writer = NicWriter {
        address,
        partial: Vec::with_capacity(3),
        outbox,
        shared,
    };
    (reader, writer)
}

fn route(
    ingress: Receiver<Packet>,
    peers: Vec<Sender<Packet>>,
    external: Sender<Packet>,
    shared: Arc<Shared>,
) {
    for packet in ingress {
        shared.touch();
        match usize::try_from(packet.dest).ok().and_then(|i| peers.get(i)) {
            Some(peer) => {
                if peer.send(packet).is_err() {
                    log::debug!("node {} has stopped, dropping {packet:?}", packet.dest);
                }
            }
            None => {
                log::debug!("no node {}, delivering {packet:?} to the owner", packet.dest);
                if external.send(packet).is_err() {
                    log::debug!("network owner is gone, dropping {packet:?}");
                }
            }
        }
    }
    log::debug!("router stopped");
}

/// The result a node's thread ends with
pub type NodeResult = Result<(), InterpreterError>;

/// A running network of interpreters
///
/// Dropping the network signals the nodes to stop without waiting for them.
/// Use [`shutdown`](Network::shutdown) to wait.
#[derive(Debug)]
pub struct Network {
    ingress: Option<Sender<Packet>>,
    external: Receiver<Packet>,
    shared: Arc<Shared>,
    config: NetworkConfig,
    nodes: Vec<JoinHandle<NodeResult>>,
    router: Option<JoinHandle<()>>,
}

impl Network {
    /// Boot `nodes` copies of `program`, with addresses `0..nodes`
    ///
    /// # Errors
    ///
    /// Fails if a thread can't be spawned. Any threads already started are signaled to stop.
    pub fn spawn(program: &[i64], nodes: usize, config: NetworkConfig) -> io::Result<Self> {
        let shared = Arc::new(Shared::new());
        let (ingress, router_rx) = mpsc::channel();
        let (external_tx, external) = mpsc::channel();
        let mut network = Self {
            ingress: Some(ingress.clone()),
            external,
            shared: Arc::clone(&shared),
            config,
            nodes: Vec::with_capacity(nodes),
            router: None,
        };
        let mut peers = Vec::with_capacity(nodes);

        for address in 0..nodes {
            let (peer, inbox) = mpsc::channel();
            peers.push(peer);
            let addr = i64::try_from(address).unwrap_or(i64::MAX);
            let (reader, writer) = nic(
                addr,
                inbox,
                ingress.clone(),
                config.idle_backoff,
                Arc::clone(&shared),
            );
            let code = program.to_vec();
            let handle = thread::Builder::new()
                .name(format!("nic-{address}"))
                .spawn(move || {
                    let mut interp = Interpreter::with_io(code, reader, writer);
                    let result = interp.run();
                    log::debug!("node {addr} stopped: {result:?}");
                    result
                })?;
            network.nodes.push(handle);
        }
        drop(ingress);

        network.router = Some(
            thread::Builder::new()
                .name("router".into())
                .spawn(move || route(router_rx, peers, external_tx, shared))?,
        );
        log::debug!("network of {nodes} nodes booted");
        Ok(network)
    }

    /// Inject `packet` into the router
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Disconnected`] if the router has stopped.
    pub fn send(&self, packet: Packet) -> Result<(), IoError> {
        self.ingress
            .as_ref()
            .ok_or(IoError::Disconnected)?
            .send(packet)
            .map_err(|_| IoError::Disconnected)
    }

    /// Wait up to `timeout` for a packet addressed outside of the network
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Packet> {
        self.external.recv_timeout(timeout).ok()
    }

    /// When a packet last went through the router
    ///
    /// Before any traffic, this is when the network booted.
    pub fn last_activity(&self) -> Instant {
        self.shared.last_activity()
    }

    /// Whether the router has gone [`idle_timeout`](NetworkConfig::idle_timeout) without traffic
    pub fn is_idle(&self) -> bool {
        self.last_activity().elapsed() >= self.config.idle_timeout
    }

    /// Stop every node and the router, returning how each node's thread ended, by address
    ///
    /// Nodes stop at their next I/O. Reading past queued input faults with
    /// [`InterpreterError::NoInput`], and writing faults with [`InterpreterError::NoOutput`], both
    /// with an [`IoError`] as the source.
    pub fn shutdown(mut self) -> Vec<NodeResult> {
        self.shared.shutdown.store(true, Ordering::Relaxed);
        self.ingress = None;
        let results = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect();
        if let Some(Err(e)) = self.router.take().map(JoinHandle::join) {
            std::panic::resume_unwind(e);
        }
        results
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Relaxed);
    }
}
