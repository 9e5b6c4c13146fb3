use std::path::Path;

use hound::{SampleFormat, WavSpec};

/// Loads the first channel of a 16-bit or 32-bit float wav file.
pub fn load(p: impl AsRef<Path>) -> hound::Result<(WavSpec, Vec<f32>)> {
    let mut reader = hound::WavReader::open(&p)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    let buf: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .step_by(channels)
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .step_by(channels)
            .map(|x| x.map(|x| x as f32 / i16::MAX as f32))
            .collect::<Result<_, _>>()?,
        _ => return Err(hound::Error::Unsupported),
    };
    Ok((spec, buf))
}

/// Saves `buf` as a mono file in the sample format of `spec`.
pub fn save(p: impl AsRef<Path>, spec: WavSpec, buf: &[f32]) -> hound::Result<()> {
    let spec = WavSpec { channels: 1, ..spec };
    let mut writer = hound::WavWriter::create(p, spec)?;
    match spec.sample_format {
        SampleFormat::Float => {
            for &x in buf {
                writer.write_sample(x)?;
            }
        }
        SampleFormat::Int => {
            for &x in buf {
                writer.write_sample(
                    (x * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16,
                )?;
            }
        }
    }
    writer.finalize()
}
