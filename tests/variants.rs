use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use sonoplot::{SonoplotError, VARIANTS};

const CONFIG: &str = r#"
[spectrogram]
keep_states = 512
image_resolution = 512
min_frequency = 0
max_frequency = 22050
time_width = 200

[fft]
frame_len = 4096
hop_len = 512
"#;

/// A scratch `root/plot` directory with `root/config.toml` next to it.
fn scratch(name: &str, config: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("sonoplot-it-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&root);
    let plot = root.join("plot");
    fs::create_dir_all(&plot).unwrap();
    fs::write(root.join("config.toml"), config).unwrap();
    plot
}

fn write_png(path: &Path, width: u32, height: u32, colour: png::ColorType, data: &[u8]) {
    let w = BufWriter::new(File::create(path).unwrap());
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(colour);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(data).unwrap();
}

fn write_sources(dir: &Path) {
    let (w, h) = (48u32, 24u32);
    let mut rgb = Vec::new();
    for y in 0..h {
        for x in 0..w {
            rgb.extend_from_slice(&[(x * 5) as u8, (y * 10) as u8, 128]);
        }
    }
    write_png(&dir.join(sonoplot::LINEAR_SOURCE), w, h, png::ColorType::Rgb, &rgb);

    let grey: Vec<u8> = (0..w * h).map(|i| (i % 256) as u8).collect();
    write_png(&dir.join(sonoplot::LOG_SOURCE), w, h, png::ColorType::Grayscale, &grey);
}

fn metadata(path: &Path) -> (u32, u32, BTreeMap<String, String>) {
    let decoder = png::Decoder::new(File::open(path).unwrap());
    let reader = decoder.read_info().unwrap();
    let info = reader.info();
    let text = info
        .uncompressed_latin1_text
        .iter()
        .map(|chunk| (chunk.keyword.clone(), chunk.text.clone()))
        .collect();
    (info.width, info.height, text)
}

fn file_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn writes_every_declared_variant() {
    let dir = scratch("complete", CONFIG);
    write_sources(&dir);

    let written = sonoplot::run(&dir).unwrap();
    let expected: Vec<PathBuf> = VARIANTS.iter().map(|v| dir.join(v.output)).collect();
    assert_eq!(written, expected);

    let mut names: BTreeSet<String> = VARIANTS.iter().map(|v| v.output.to_string()).collect();
    names.insert(sonoplot::LINEAR_SOURCE.to_string());
    names.insert(sonoplot::LOG_SOURCE.to_string());
    assert_eq!(file_names(&dir), names);

    for path in &written {
        let (width, height, text) = metadata(path);
        assert_eq!((width, height), (sonoplot::FIGURE_WIDTH, sonoplot::FIGURE_HEIGHT));
        assert_eq!(text["y-ticks"], "0 22050");
        assert_eq!(text["x-label"], "Time (s)");
    }
}

#[test]
fn labels_follow_the_variant() {
    let dir = scratch("labels", CONFIG);
    write_sources(&dir);
    sonoplot::run(&dir).unwrap();

    let (_, _, full) = metadata(&dir.join("plot-log.png"));
    assert_eq!(full["y-label"], "Frequency (Hz)");
    assert_eq!(full["colorbar"], "Magnitude (dB)");
    assert_eq!(full["colorbar-range"], "0 50");
    assert_eq!(full["frequency-scale"], "log");

    let (_, _, bare) = metadata(&dir.join("plot-no-colorbar-ylabel.png"));
    assert!(!bare.contains_key("y-label"));
    assert!(!bare.contains_key("colorbar"));

    let (_, _, no_bar) = metadata(&dir.join("plot-no-colorbar.png"));
    assert_eq!(no_bar["y-label"], "Frequency (Hz)");
    assert!(!no_bar.contains_key("colorbar"));

    let (_, _, no_ylabel) = metadata(&dir.join("plot-no-ylabel.png"));
    assert!(!no_ylabel.contains_key("y-label"));
    assert_eq!(no_ylabel["colorbar"], "Magnitude (dB)");

    let (_, _, linear) = metadata(&dir.join("plot-linear.png"));
    assert_eq!(linear["frequency-scale"], "linear");

    let extent: Vec<f64> = linear["extent"]
        .split(' ')
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(extent[0], 0.0);
    assert!((extent[1] - 512.0 / 44100.0 * 200.0).abs() < 1e-12);
    assert_eq!(&extent[2..], &[0.0, 22050.0]);
}

#[test]
fn band_above_zero_is_ticked_at_the_top_only() {
    let config = CONFIG
        .replace("min_frequency = 0\n", "min_frequency = 5.0\n")
        .replace("max_frequency = 22050\n", "max_frequency = 8000\n");
    let dir = scratch("band", &config);
    write_sources(&dir);

    for path in sonoplot::run(&dir).unwrap() {
        let (_, _, text) = metadata(&path);
        assert_eq!(text["y-ticks"], "8000", "{}", path.display());
        assert!(text["extent"].ends_with(" 5 8000"), "{}", text["extent"]);
    }
}

#[test]
fn reruns_are_byte_identical() {
    let dir = scratch("idempotent", CONFIG);
    write_sources(&dir);

    let first: Vec<Vec<u8>> = sonoplot::run(&dir)
        .unwrap()
        .iter()
        .map(|p| fs::read(p).unwrap())
        .collect();
    let second: Vec<Vec<u8>> = sonoplot::run(&dir)
        .unwrap()
        .iter()
        .map(|p| fs::read(p).unwrap())
        .collect();

    assert_eq!(first.len(), VARIANTS.len());
    assert!(first == second);
}

#[test]
fn missing_max_frequency_writes_nothing() {
    let config = CONFIG.replace("max_frequency = 22050\n", "");
    let dir = scratch("fatal-config", &config);
    write_sources(&dir);
    let before = file_names(&dir);

    let err = sonoplot::run(&dir).unwrap_err();
    assert!(err.is_config());
    assert!(matches!(err, SonoplotError::MissingSetting(ref key) if key == "spectrogram.max_frequency"));
    assert_eq!(file_names(&dir), before);
}

#[test]
fn missing_config_file_is_fatal() {
    let dir = scratch("no-config", CONFIG);
    fs::remove_file(dir.join(sonoplot::CONFIG_FILE)).unwrap();
    write_sources(&dir);

    let err = sonoplot::run(&dir).unwrap_err();
    assert!(matches!(err, SonoplotError::ConfigRead { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn missing_bitmap_names_the_file() {
    let dir = scratch("no-bitmap", CONFIG);
    write_sources(&dir);
    fs::remove_file(dir.join(sonoplot::LOG_SOURCE)).unwrap();

    let err = sonoplot::run(&dir).unwrap_err();
    match err {
        SonoplotError::NotFound(path) => assert_eq!(path, dir.join(sonoplot::LOG_SOURCE)),
        other => panic!("unexpected error: {}", other),
    }

    // Jobs run in order, the linear plot was made before the failure
    assert!(dir.join("plot-linear.png").exists());
    assert!(!dir.join("plot-log.png").exists());
}
