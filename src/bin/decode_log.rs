//! Decode a captured log line (raw bytes on stdin) into one JSON object per line.
//!
//! `cat /dev/ttyUSB0 | decode_log` or `decode_log < capture.bin`
//!
//! Undecodable frames are reported on stderr. With `DECODE_LOG_QUIET` set, only errors are.

use std::io::{self, BufWriter, Read, Write};
use std::process::ExitCode;

use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};

use telemetry_logger::{DecodeError, FrameDecoder, Record};

fn init_logging() {
    let level = match std::env::var_os("DECODE_LOG_QUIET") {
        Some(_) => LevelFilter::ERROR,
        None => LevelFilter::INFO,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn emit(out: &mut impl Write, record: &Record, json: &mut [u8]) -> io::Result<()> {
    match record.write_json(json) {
        Ok(len) => {
            out.write_all(&json[..len])?;
            out.write_all(b"\n")
        }
        Err(err) => {
            error!(timestamp_ms = record.timestamp_ms(), "cannot render record: {}", err);
            Ok(())
        }
    }
}

fn run() -> io::Result<usize> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut input = stdin.lock();

    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 4096];
    let mut json = [0u8; 512];
    let mut rejected = 0usize;

    let mut handle = |result: Result<Record, DecodeError>, out: &mut BufWriter<io::StdoutLock>| match result {
        Ok(record) => emit(out, &record, &mut json),
        Err(err) => {
            rejected += 1;
            warn!("dropping frame: {}", err);
            Ok(())
        }
    };

    loop {
        let read = input.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        for result in decoder.decode(&chunk[..read]) {
            handle(result, &mut out)?;
        }
    }
    if let Some(result) = decoder.finish() {
        handle(result, &mut out)?;
    }
    out.flush()?;
    Ok(rejected)
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(rejected) => {
            info!(rejected, "some frames could not be decoded");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("reading capture failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
