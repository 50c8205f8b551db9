//! wgpu timestamp queries behind the [`QueryRing`] interface.
//!
//! Each slot owns two timestamps written at the beginning and end of the frame's
//! render pass. After the pass, the pair is resolved into a shared resolve buffer
//! and copied into the slot's own readback buffer; once the frame is submitted the
//! readback buffer is mapped asynchronously and picked up on a later frame.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use crate::benchmarks::{QueryError, QueryPoll, QueryRing};

const TIMESTAMPS_PER_SLOT: u32 = 2;
const TIMESTAMP_SIZE: wgpu::BufferAddress = std::mem::size_of::<u64>() as wgpu::BufferAddress;
const SLOT_SIZE: wgpu::BufferAddress = TIMESTAMP_SIZE * TIMESTAMPS_PER_SLOT as wgpu::BufferAddress;

type MapResult = Result<(), wgpu::BufferAsyncError>;

struct Readback {
    buffer: wgpu::Buffer,
    mapping: Option<Receiver<MapResult>>,
}

/// Ring of begin/end timestamp pairs for render passes.
pub struct TimestampRing {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    readbacks: Vec<Readback>,
    period_ns: f64,
}

fn resolve_offset(slot: usize) -> wgpu::BufferAddress {
    slot as wgpu::BufferAddress * wgpu::QUERY_RESOLVE_BUFFER_ALIGNMENT
}

impl TimestampRing {
    /// Creates `depth` slots on `device`.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        depth: usize,
    ) -> Result<Self, QueryError> {
        if !device.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
            return Err(QueryError::Unsupported);
        }
        let period = queue.get_timestamp_period();
        if period.is_nan() || period <= 0.0 {
            return Err(QueryError::InvalidPeriod(period));
        }

        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("frame_timestamps"),
            ty: wgpu::QueryType::Timestamp,
            count: depth as u32 * TIMESTAMPS_PER_SLOT,
        });
        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_timestamps_resolve"),
            size: resolve_offset(depth),
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readbacks = (0..depth)
            .map(|_| Readback {
                buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("frame_timestamps_readback"),
                    size: SLOT_SIZE,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                mapping: None,
            })
            .collect();

        Ok(Self {
            query_set,
            resolve_buffer,
            readbacks,
            period_ns: f64::from(period),
        })
    }

    /// Timestamp writes bracketing a render pass with `slot`.
    pub fn timestamp_writes(&self, slot: usize) -> wgpu::RenderPassTimestampWrites<'_> {
        let first = slot as u32 * TIMESTAMPS_PER_SLOT;
        wgpu::RenderPassTimestampWrites {
            query_set: &self.query_set,
            beginning_of_pass_write_index: Some(first),
            end_of_pass_write_index: Some(first + 1),
        }
    }

    /// Encodes the copy of `slot`'s timestamps into its readback buffer.
    pub fn resolve(&self, slot: usize, encoder: &mut wgpu::CommandEncoder) {
        let first = slot as u32 * TIMESTAMPS_PER_SLOT;
        let offset = resolve_offset(slot);
        encoder.resolve_query_set(
            &self.query_set,
            first..first + TIMESTAMPS_PER_SLOT,
            &self.resolve_buffer,
            offset,
        );
        encoder.copy_buffer_to_buffer(
            &self.resolve_buffer,
            offset,
            &self.readbacks[slot].buffer,
            0,
            SLOT_SIZE,
        );
    }
}

impl QueryRing for TimestampRing {
    fn submitted(&mut self, slot: usize) {
        let (sender, receiver) = mpsc::channel();
        let readback = &mut self.readbacks[slot];
        readback
            .buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = sender.send(result);
            });
        readback.mapping = Some(receiver);
    }

    // The caller polls the device before asking, so a finished mapping has
    // already delivered its callback.
    fn poll(&mut self, slot: usize) -> QueryPoll {
        let readback = &mut self.readbacks[slot];
        let Some(mapping) = &readback.mapping else {
            return QueryPoll::Failed;
        };

        match mapping.try_recv() {
            Err(TryRecvError::Empty) => QueryPoll::Pending,
            Err(TryRecvError::Disconnected) | Ok(Err(_)) => {
                readback.mapping = None;
                QueryPoll::Failed
            }
            Ok(Ok(())) => {
                readback.mapping = None;
                let ticks = {
                    let data = readback.buffer.slice(..).get_mapped_range();
                    let read = |at: usize| {
                        let mut bytes = [0u8; 8];
                        bytes.copy_from_slice(&data[at..at + 8]);
                        u64::from_le_bytes(bytes)
                    };
                    read(8).saturating_sub(read(0))
                };
                readback.buffer.unmap();
                QueryPoll::Ready((ticks as f64 * self.period_ns) as u64)
            }
        }
    }
}
