mod wav;

use worldshift::{power, FormantShifter, ShiftParams};

fn main() {
    let mut args = std::env::args().skip(1);
    let file = args.next().unwrap_or("voice.wav".to_string());
    let shift: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1.5);
    let ratio: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1.2);
    let params = ShiftParams::new(shift, ratio);

    let (spec, buf) = wav::load(&file).expect("failed to load wav");
    dbg!(power(&buf));

    if !params.is_effective() {
        eprintln!("shift {} and ratio {} leave the voice unchanged", shift, ratio);
        return;
    }

    let start = std::time::Instant::now();
    let buf = FormantShifter::new()
        .process_fitted(&buf, spec.sample_rate, &params)
        .expect("formant shift failed");
    dbg!(start.elapsed());
    dbg!(power(&buf));

    wav::save(file.replace(".wav", "_out.wav"), spec, &buf).expect("failed to save wav");
}
