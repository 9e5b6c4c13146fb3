mod common;

use common::ScriptedVocoder;
use worldshift::{
    modification::flat_tail_start, AnalysisConfig, Error, FormantShifter, PitchEstimator,
    ShiftParams, Stage,
};

const FS: u32 = 16000;
const FFT_SIZE: usize = 1024;

fn shifter(frames: usize) -> FormantShifter<ScriptedVocoder> {
    FormantShifter::with_vocoder(ScriptedVocoder::new(frames, FFT_SIZE))
}

#[test]
fn stages_run_in_order() {
    let shifter = shifter(10);
    shifter
        .process(&[0.1f32; 720], FS, &ShiftParams::default())
        .unwrap();
    assert_eq!(
        shifter.vocoder().calls(),
        vec![
            Stage::Pitch,
            Stage::PitchRefinement,
            Stage::Envelope,
            Stage::Aperiodicity,
            Stage::Synthesis,
        ]
    );
}

#[test]
fn process_into_runs_each_stage_once() {
    let shifter = shifter(10);
    let mut out = vec![0.0f32; 721];
    shifter
        .process_into(&[0.1f32; 720], FS, &ShiftParams::new(1.2, 0.9), &mut out)
        .unwrap();
    assert_eq!(
        shifter.vocoder().calls(),
        vec![
            Stage::Pitch,
            Stage::PitchRefinement,
            Stage::Envelope,
            Stage::Aperiodicity,
            Stage::Synthesis,
        ]
    );
}

#[test]
fn pitch_estimator_reaches_the_vocoder() {
    let dio = shifter(4);
    dio.analyze(&[0.0f32; 400], FS).unwrap();
    assert_eq!(*dio.vocoder().estimator.borrow(), Some(PitchEstimator::Dio));

    let harvest = shifter(4)
        .with_config(AnalysisConfig::new().with_pitch_estimator(PitchEstimator::Harvest));
    harvest
        .process(&[0.0f32; 400], FS, &ShiftParams::new(1.1, 1.0))
        .unwrap();
    assert_eq!(
        *harvest.vocoder().estimator.borrow(),
        Some(PitchEstimator::Harvest)
    );
}

#[test]
fn output_length_follows_frame_count() {
    let shifter = shifter(10);
    let output = shifter
        .process(&[0.0f32; 720], FS, &ShiftParams::new(1.3, 0.9))
        .unwrap();
    assert_eq!(output.len(), 721);
    assert_eq!(shifter.output_len(720, FS), 721);
    assert_eq!(shifter.vocoder().synthesis_call().y_length, 721);
}

#[test]
fn synthesis_starts_from_a_zeroed_buffer() {
    let shifter = shifter(10);
    shifter
        .process(&[0.3f32; 720], FS, &ShiftParams::default())
        .unwrap();
    assert!(shifter.vocoder().synthesis_call().zeroed);
}

#[test]
fn pitch_shift_scales_refined_f0() {
    let shifter = shifter(6);
    shifter
        .process(&[0.0f64; 400], FS, &ShiftParams::new(1.5, 1.0))
        .unwrap();
    let call = shifter.vocoder().synthesis_call();
    let expected: Vec<f64> = (0..6)
        .map(|i| {
            let f = ScriptedVocoder::coarse_f0(i);
            if f > 0.0 {
                (f + 0.5) * 1.5
            } else {
                0.0
            }
        })
        .collect();
    assert_eq!(call.f0, expected);
    assert_eq!(call.f0[2], 0.0);
}

#[test]
fn identity_shift_preserves_envelope() {
    let shifter = shifter(4);
    shifter
        .process(&[0.0f64; 400], FS, &ShiftParams::default())
        .unwrap();
    let call = shifter.vocoder().synthesis_call();
    for frame in call.spectrogram.iter() {
        for (j, &m) in frame.iter().enumerate() {
            let expected = ScriptedVocoder::log_envelope(j).exp();
            assert!((m - expected).abs() <= 1e-12 * expected);
        }
    }
}

#[test]
fn formant_shift_warps_envelope_and_keeps_aperiodicity() {
    let ratio = 0.5;
    let shifter = shifter(3);
    shifter
        .process(&[0.0f64; 400], FS, &ShiftParams::new(1.0, ratio))
        .unwrap();
    let call = shifter.vocoder().synthesis_call();
    assert_eq!(call.fft_size, FFT_SIZE);

    let cutoff = flat_tail_start(FFT_SIZE, ratio).unwrap();
    assert_eq!(cutoff, 256);
    for frame in call.spectrogram.iter() {
        // bin j reads the original log envelope at j / ratio
        for j in 0..cutoff {
            let expected = ScriptedVocoder::log_envelope(2 * j).exp();
            assert!((frame[j] - expected).abs() <= 1e-9 * expected);
        }
        assert!(frame[cutoff..].iter().all(|&m| m == frame[cutoff - 1]));
    }
    assert!(call.aperiodicity.as_slice().iter().all(|&a| a == 0.25));
}

#[test]
fn output_is_clipped_and_narrowed() {
    let vocoder = ScriptedVocoder::new(2, FFT_SIZE).with_output(vec![3.0, -2.0, 0.5, -0.25]);
    let shifter = FormantShifter::with_vocoder(vocoder);
    let output: Vec<f32> = shifter
        .process(&[0.0f32; 100], FS, &ShiftParams::default())
        .unwrap();
    assert_eq!(output.len(), 81);
    assert_eq!(&output[..4], &[1.0, -1.0, 0.5, -0.25]);
    assert!(output.iter().all(|s| (-1.0..=1.0).contains(s)));
}

#[test]
fn primitive_failures_abort_the_run() {
    for stage in [
        Stage::Pitch,
        Stage::PitchRefinement,
        Stage::Envelope,
        Stage::Aperiodicity,
        Stage::Synthesis,
    ] {
        let vocoder = ScriptedVocoder::new(10, FFT_SIZE).failing_at(stage);
        let shifter = FormantShifter::with_vocoder(vocoder);
        let mut out = vec![9.0f32; 800];
        let result = shifter.process_into(&[0.0f32; 720], FS, &ShiftParams::default(), &mut out);
        assert!(
            matches!(result, Err(Error::Primitive { stage: s, .. }) if s == stage),
            "{:?}: {:?}",
            stage,
            result
        );
        assert!(out.iter().all(|&s| s == 9.0));
        assert_eq!(shifter.vocoder().calls().last(), Some(&stage));
    }
}

#[test]
fn process_into_checks_capacity_before_running() {
    let shifter = shifter(10);
    let mut small = vec![0.0f32; 720];
    assert_eq!(
        shifter.process_into(&[0.0f32; 720], FS, &ShiftParams::default(), &mut small),
        Err(Error::OutputTooSmall {
            required: 721,
            capacity: 720
        })
    );
    assert!(shifter.vocoder().calls().is_empty());

    let mut big = vec![7.0f32; 1000];
    let written = shifter
        .process_into(&[0.0f32; 720], FS, &ShiftParams::default(), &mut big)
        .unwrap();
    assert_eq!(written, 721);
    assert!(big[..721].iter().all(|&s| s == 0.25));
    assert!(big[721..].iter().all(|&s| s == 7.0));
}

#[test]
fn invalid_inputs_are_rejected_before_analysis() {
    let shifter = shifter(10);
    let params = ShiftParams::default();
    assert_eq!(
        shifter.process::<f32>(&[], FS, &params),
        Err(Error::EmptyInput)
    );
    assert_eq!(
        shifter.process(&[0.0f32; 720], 0, &params),
        Err(Error::InvalidSampleRate(0))
    );
    assert_eq!(
        shifter.process(&[0.0f32, f32::INFINITY], FS, &params),
        Err(Error::NonFiniteInput)
    );
    assert_eq!(
        shifter.process(&[0.0f32; 40], FS, &params),
        Err(Error::InputTooShort {
            provided: 40,
            minimum: 80
        })
    );
    assert_eq!(
        shifter.process(&[0.0f32; 720], FS, &ShiftParams::new(-1.0, 1.0)),
        Err(Error::InvalidShift(-1.0))
    );
    assert_eq!(
        shifter.process(&[0.0f32; 720], FS, &ShiftParams::new(1.0, 0.0)),
        Err(Error::InvalidRatio(0.0))
    );
    assert!(shifter.vocoder().calls().is_empty());
}

#[test]
fn ratio_too_small_for_fft_size_fails_in_modification() {
    let shifter = shifter(3);
    let ratio = 0.001;
    assert_eq!(
        shifter.process(&[0.0f32; 400], FS, &ShiftParams::new(1.0, ratio)),
        Err(Error::InvalidRatio(ratio))
    );
    assert!(!shifter.vocoder().calls().contains(&Stage::Synthesis));
}

#[test]
fn degenerate_fft_size_is_a_primitive_failure() {
    let shifter = FormantShifter::with_vocoder(ScriptedVocoder::new(3, 1));
    assert!(matches!(
        shifter.process(&[0.0f32; 400], FS, &ShiftParams::default()),
        Err(Error::Primitive {
            stage: Stage::Envelope,
            ..
        })
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let shifter = shifter(3).with_config(AnalysisConfig::new().with_aperiodicity_threshold(2.0));
    assert!(matches!(
        shifter.process(&[0.0f32; 400], FS, &ShiftParams::default()),
        Err(Error::InvalidConfig { .. })
    ));
}

#[test]
fn analysis_keeps_coarse_time_axis() {
    let shifter = shifter(5);
    let analysis = shifter.analyze(&[0.0f32; 400], FS).unwrap();
    assert_eq!(analysis.f0_length(), 5);
    assert_eq!(analysis.fft_size, FFT_SIZE);
    assert_eq!(analysis.bins(), 513);
    assert_eq!(
        analysis.time_axis,
        *shifter.vocoder().coarse_time_axis.borrow()
    );
    assert_eq!(analysis.time_axis[1], 0.005);
    assert!(analysis.check_shape().is_ok());
}

#[test]
fn fitted_output_matches_input_length() {
    let shifter = shifter(10);
    let output = shifter
        .process_fitted(&[0.0f32; 720], FS, &ShiftParams::default())
        .unwrap();
    assert_eq!(output.len(), 720);
    assert!(output.iter().all(|&s| (s - 0.25).abs() < 1e-6));
}
