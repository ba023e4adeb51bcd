use std::cell::Cell;

use embedded_dma::ReadBuffer;
use telemetry_logger::config::LOG_BUFFER_LEN;
use telemetry_logger::datamodel::rc_channels::RC_CHANNEL_COUNT;
use telemetry_logger::datamodel::record::RcChannelsFrame;
use telemetry_logger::{
    DoubleBuffer, FrameDecoder, LogError, LoggerConfig, MonotonicClock, RcChannels, Record,
    Sample, SerialTransmitter, TelemetryLogger, TxSlice,
};

/// Clock moved by hand, optionally ticking on every read.
struct ManualClock {
    now: Cell<u32>,
    tick: u32,
}

impl ManualClock {
    fn new() -> Self {
        Self { now: Cell::new(0), tick: 0 }
    }

    fn advance(&self, ms: u32) {
        self.now.set(self.now.get() + ms);
    }
}

impl MonotonicClock for ManualClock {
    fn now_ms(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now + self.tick);
        now
    }
}

/// Copies every transfer at start and stays busy for a number of polls.
#[derive(Default)]
struct RecordingTx {
    transfers: Vec<(usize, Vec<u8>)>,
    busy_polls: u32,
    remaining: Cell<u32>,
    polls_while_busy: Cell<u32>,
}

impl RecordingTx {
    fn busy_for(polls: u32) -> Self {
        Self { busy_polls: polls, ..Self::default() }
    }

    fn wire(&self) -> Vec<u8> {
        self.transfers.iter().flat_map(|(_, bytes)| bytes.clone()).collect()
    }
}

impl SerialTransmitter for RecordingTx {
    fn start(&mut self, buffer: TxSlice) {
        assert_eq!(self.remaining.get(), 0, "started while a transfer was running");
        let bytes = unsafe {
            let (ptr, len) = buffer.read_buffer();
            std::slice::from_raw_parts(ptr, len).to_vec()
        };
        self.transfers.push((buffer.address(), bytes));
        self.remaining.set(self.busy_polls);
    }

    fn is_busy(&self) -> bool {
        let remaining = self.remaining.get();
        if remaining > 0 {
            self.remaining.set(remaining - 1);
            self.polls_while_busy.set(self.polls_while_busy.get() + 1);
        }
        remaining > 0
    }
}

fn buffers() -> DoubleBuffer {
    DoubleBuffer::new(
        Box::leak(Box::new([0; LOG_BUFFER_LEN])),
        Box::leak(Box::new([0; LOG_BUFFER_LEN])),
    )
}

fn new_logger(tx: RecordingTx) -> TelemetryLogger<RecordingTx, ManualClock> {
    TelemetryLogger::new(buffers(), tx, ManualClock::new())
}

fn known_channels(base: u16) -> RcChannels {
    let mut rc = RcChannels::new();
    let mut channels = [0u16; RC_CHANNEL_COUNT];
    for (i, channel) in channels.iter_mut().enumerate() {
        *channel = base + i as u16;
    }
    rc.update(channels, 1);
    rc
}

fn decode(wire: &[u8]) -> Vec<Result<Record, telemetry_logger::DecodeError>> {
    let mut decoder = FrameDecoder::new();
    let mut records: Vec<_> = decoder.decode(wire).collect();
    records.extend(decoder.finish());
    records
}

#[test]
fn flush_by_size_sends_one_full_buffer() {
    let mut logger = new_logger(RecordingTx::default());
    for i in 0..LOG_BUFFER_LEN {
        logger.append_byte(i as u8).unwrap();
    }

    let tx = logger.transmitter();
    assert_eq!(tx.transfers.len(), 1);
    assert_eq!(tx.transfers[0].1.len(), LOG_BUFFER_LEN);
    assert_eq!(tx.transfers[0].1[511], (511 % 256) as u8);
    assert_eq!(logger.buffers().active_slot(), 1);
}

#[test]
fn flush_by_time_sends_pending_bytes() {
    let mut logger = new_logger(RecordingTx::default());
    logger.append_byte(0xAA).unwrap();
    logger.clock().advance(1001);
    logger.append_byte(0xBB).unwrap();

    let tx = logger.transmitter();
    assert_eq!(tx.transfers.len(), 1);
    assert_eq!(tx.transfers[0].1, vec![0xAA, 0xBB]);
}

#[test]
fn buffers_alternate_starting_with_slot_zero() {
    let mut logger = new_logger(RecordingTx::default());
    let slots = [logger.buffers().slot_address(0), logger.buffers().slot_address(1)];

    for _ in 0..(5 * LOG_BUFFER_LEN) {
        logger.append_byte(0x42).unwrap();
    }

    let addresses: Vec<usize> = logger.transmitter().transfers.iter().map(|(a, _)| *a).collect();
    assert_eq!(
        addresses,
        vec![slots[0], slots[1], slots[0], slots[1], slots[0]]
    );
}

#[test]
fn flush_waits_for_previous_transfer() {
    let mut logger = new_logger(RecordingTx::busy_for(3));
    for _ in 0..(2 * LOG_BUFFER_LEN) {
        logger.append_byte(0).unwrap();
    }
    let tx = logger.transmitter();
    assert_eq!(tx.transfers.len(), 2);
    assert_eq!(tx.polls_while_busy.get(), 3);
}

#[test]
fn stalled_transmitter_is_reported() {
    let clock = ManualClock { now: Cell::new(0), tick: 1 };
    let config = LoggerConfig::new().with_stall_timeout_ms(20);
    let mut logger =
        TelemetryLogger::with_config(buffers(), RecordingTx::busy_for(u32::MAX), clock, config);

    let mut outcome = Ok(());
    for _ in 0..(2 * LOG_BUFFER_LEN) {
        outcome = outcome.and(logger.append_byte(0x01));
    }
    assert!(matches!(
        outcome,
        Err(LogError::TransmitterStalled { dropped: LOG_BUFFER_LEN, .. })
    ));
    assert_eq!(logger.transmitter().transfers.len(), 1);
    assert_eq!(logger.stats().stalls, 1);
}

#[test]
fn rc_frames_are_gated_on_first_update() {
    let mut logger = new_logger(RecordingTx::default());
    logger.log_rc_channels(&RcChannels::new()).unwrap();
    assert!(logger.buffers().is_empty());

    logger.clock().advance(20);
    logger.log_rc_channels(&known_channels(1000)).unwrap();
    assert_eq!(logger.buffers().len(), 1 + 4 + 1 + 32);
}

#[test]
fn frames_survive_buffer_boundaries() {
    let mut logger = new_logger(RecordingTx::default());
    let mut expected = Vec::new();
    for cycle in 0..40u32 {
        logger.clock().advance(20);
        // 0x7E and 0x7D inside the channel values force escapes
        let rc = known_channels(0x7E00 + cycle as u16);
        logger.log_rc_channels(&rc).unwrap();
        logger.log_samples(&[Sample::new(1, cycle as i32), Sample::new(2, -(cycle as i32))]).unwrap();
        expected.push(20 * (cycle + 1));
    }
    logger.flush().unwrap();

    let tx = logger.transmitter();
    assert!(tx.transfers.len() > 2);
    let records = decode(&tx.wire());
    assert_eq!(records.len(), 80);

    for (cycle, pair) in records.chunks(2).enumerate() {
        let rc = known_channels(0x7E00 + cycle as u16);
        assert_eq!(
            pair[0],
            Ok(Record::RcChannels(RcChannelsFrame {
                timestamp_ms: expected[cycle],
                channels_us: rc.channels_us,
            }))
        );
        match &pair[1] {
            Ok(Record::Samples(frame)) => {
                assert_eq!(frame.timestamp_ms, expected[cycle]);
                assert_eq!(
                    frame.samples.as_slice(),
                    &[Sample::new(1, cycle as i32), Sample::new(2, -(cycle as i32))]
                );
            }
            other => panic!("expected samples, got {:?}", other),
        }
    }
}

#[test]
fn invalid_sample_tags_write_nothing() {
    let mut logger = new_logger(RecordingTx::default());
    let err = logger
        .log_samples(&[Sample::new(3, 1), Sample::new(0x41, 1)])
        .unwrap_err();
    assert_eq!(err, LogError::InvalidSampleTag(0x41));
    assert!(logger.buffers().is_empty());

    logger.log_samples(&[]).unwrap();
    assert!(logger.buffers().is_empty());
}
