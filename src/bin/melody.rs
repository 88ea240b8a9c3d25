//! Demo driver: plays a short melody on the chromatic bank through the
//! system audio device.
//!
//! Run with `cargo run --features playback --bin melody`.

use std::thread;
use std::time::Duration;

use keytone::device::CpalDevice;
use keytone::{EngineConfig, EngineError, Piano, PlaybackContext};

/// Chromatic base frequencies, B3 through C5.
const FREQUENCIES: &[f64] = &[
    246.941650628,
    261.625565301,
    277.182630977,
    293.664767917,
    311.126983722,
    329.627556913,
    349.228231433,
    369.994422712,
    391.995435982,
    415.30469758,
    440.0,
    466.163761518,
    493.883301256,
    523.251130601,
];

fn play_sound(
    piano: &mut Piano,
    ctx: &mut PlaybackContext<CpalDevice>,
    note: usize,
    batch: usize,
    hold_ms: u64,
) -> Result<(), EngineError> {
    piano.note_on(note);
    let result = ctx.play(piano, batch);
    thread::sleep(Duration::from_millis(hold_ms));
    ctx.close()?;
    piano.note_off(note);
    result
}

fn main() -> Result<(), EngineError> {
    env_logger::init();

    let config = EngineConfig::default();
    let mut piano = Piano::new(FREQUENCIES, &config);
    let device = CpalDevice::new().map_err(EngineError::DeviceInit)?;
    let mut ctx = PlaybackContext::new(device, config)?;

    let phrase1: &[(usize, usize, u64)] = &[(6, 70, 500), (4, 70, 500), (2, 10, 1000)];
    let phrase2: &[(usize, usize, u64)] = &[
        (6, 100, 300),
        (4, 80, 500),
        (2, 80, 500),
        (2, 100, 300),
        (2, 10, 1000),
    ];
    let phrase3: &[(usize, usize, u64)] = &[
        (2, 100, 300),
        (4, 150, 300),
        (6, 150, 300),
        (6, 150, 300),
        (6, 150, 300),
        (7, 150, 300),
        (6, 150, 300),
        (2, 150, 300),
        (2, 150, 300),
        (6, 150, 300),
    ];
    let phrase4: &[(usize, usize, u64)] = &[
        (6, 80, 300),
        (4, 50, 600),
        (2, 200, 180),
        (2, 10, 1000),
    ];

    for (phrase, rest_ms) in [
        (phrase1, 100),
        (phrase2, 200),
        (phrase3, 10),
        (phrase4, 0),
    ] {
        for &(note, batch, hold_ms) in phrase {
            play_sound(&mut piano, &mut ctx, note, batch, hold_ms)?;
        }
        thread::sleep(Duration::from_millis(rest_ms));
    }

    Ok(())
}
