use colorgrowth_render::{FrameWriter, save_png};

use colorgrowth_core::{CanvasGrid, GrowthConfig, GrowthSim, SeedCount};

fn painted_grid() -> GrowthSim {
    let mut sim = GrowthSim::new(GrowthConfig {
        width: 16,
        height: 12,
        seed_count: SeedCount::Fixed(2),
        rng_seed: Some(2025),
        stop_fill_fraction: 1.0,
        ..GrowthConfig::default()
    })
    .expect("sim");
    sim.run();
    sim
}

#[test]
fn save_png_writes_a_decodable_file() {
    let sim = painted_grid();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("canvas.png");

    save_png(sim.grid(), &path).expect("png saved");
    let bytes = std::fs::read(&path).expect("png bytes");
    assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n", "invalid PNG header");

    let decoded = image::open(&path).expect("decode").to_rgb8();
    assert_eq!(decoded.width(), 16);
    assert_eq!(decoded.height(), 12);
    let cell = sim.grid().cell_at(3, 5).mutated_color();
    assert_eq!(
        decoded.get_pixel(3, 5).0,
        cell.map(|channel| channel as u8),
        "pixels must mirror the settled cell colors"
    );
}

#[test]
fn frame_writer_pads_to_the_quota_width() {
    let grid = CanvasGrid::new(4, 4, [0, 0, 0]).expect("grid");
    let dir = tempfile::tempdir().expect("tempdir");
    let frames_dir = dir.path().join("frames");

    let mut writer = FrameWriter::create(&frames_dir, 1234).expect("writer");
    let first = writer.write_frame(&grid).expect("frame 0");
    let second = writer.write_frame(&grid).expect("frame 1");

    assert_eq!(first.file_name().unwrap(), "0000.png");
    assert_eq!(second.file_name().unwrap(), "0001.png");
    assert_eq!(writer.frames_written(), 2);
    assert!(frames_dir.join("0000.png").exists());
}
