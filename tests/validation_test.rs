use fracture_scan::{
    classify, decide, preprocess, Classifier, ClassifierError, ImageBatch, ResizeFilter,
    ScoreError, Threshold, Verdict,
};
use image::{DynamicImage, Rgb, RgbImage};

fn fixed(score: f32) -> impl Fn(&ImageBatch) -> Result<Vec<f32>, ScoreError> + Send + Sync {
    move |_: &ImageBatch| Ok(vec![score])
}

#[test]
fn test_invalid_thresholds() {
    for value in [0.0, 1.0, -0.1, 1.1, f32::NAN, f32::INFINITY] {
        let result = Classifier::builder().with_threshold(value);
        assert!(
            matches!(result, Err(ClassifierError::ValidationError(_))),
            "threshold {} should be rejected",
            value
        );
    }
}

#[test]
fn test_out_of_range_scores() {
    let image = DynamicImage::new_rgb8(50, 50);
    for score in [-0.2, 1.0001, 42.0, f32::NAN] {
        let result = classify(&image, &fixed(score), Threshold::default());
        assert!(
            matches!(result, Err(ClassifierError::InferenceError(_))),
            "score {} should be rejected",
            score
        );
    }
}

#[test]
fn test_score_equal_to_threshold() {
    let image = DynamicImage::new_rgb8(50, 50);
    for t in [0.1, 0.4, 0.5, 0.9] {
        let p = classify(&image, &fixed(t), Threshold::new(t).unwrap()).unwrap();
        assert_eq!(p.verdict, Verdict::Fractured, "threshold {}", t);
        assert!((p.confidence - t * 100.0).abs() < 1e-3);
    }
}

#[test]
fn test_exactly_one_verdict_for_every_score() {
    let threshold = Threshold::default();
    for i in 0..=200 {
        let score = i as f32 / 200.0;
        let p = decide(score, threshold).unwrap();
        let expected = if score >= 0.5 { Verdict::Fractured } else { Verdict::Normal };
        assert_eq!(p.verdict, expected);
    }
}

#[test]
fn test_preprocess_range_on_noisy_image() {
    let img = RgbImage::from_fn(333, 211, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    for filter in [ResizeFilter::Nearest, ResizeFilter::Bilinear, ResizeFilter::Bicubic] {
        let batch = preprocess(&DynamicImage::ImageRgb8(img.clone()), filter).unwrap();
        assert_eq!(batch.shape(), &[1, 224, 224, 3]);
        assert!(batch.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}

#[test]
fn test_preprocess_is_deterministic() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(97, 131, |x, y| {
        Rgb([(x * 2) as u8, (y * 3 % 256) as u8, 77])
    }));
    let a = preprocess(&img, ResizeFilter::Bicubic).unwrap();
    let b = preprocess(&img, ResizeFilter::Bicubic).unwrap();
    assert_eq!(a, b);
}
