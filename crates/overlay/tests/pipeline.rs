//! End-to-end runs over synthetic Landsat-style archives.

use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use ndlayer_cloud::ArchiveSource;
use ndlayer_core::io::encode_band;
use ndlayer_core::{GeoTransform, IndexKind, RasterBand, SampleBuffer, CRS};
use ndlayer_overlay::{
    spawn_run, ErrorKind, KindOutcome, MapSession, MemorySink, Pipeline, PipelineConfig,
    PipelineEvent, Stage,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const GREEN: [u8; 4] = [0, 128, 0, 255];
const BROWN: [u8; 4] = [139, 69, 19, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn utm_band(name: &str, size: usize, value: u16) -> RasterBand {
    RasterBand::new(name, size, size, vec![value; size * size])
        .with_transform(GeoTransform::new(600_000.0, 4_530_000.0, 30.0, -30.0))
        .with_crs(Some(CRS::utm(18, true)))
}

fn archive(bands: &[(&str, &RasterBand)]) -> Vec<u8> {
    let mut w = ZipWriter::new(Cursor::new(Vec::new()));
    w.add_directory("LC08_L2SP_014032/", SimpleFileOptions::default())
        .unwrap();
    for (name, band) in bands {
        w.start_file(format!("LC08_L2SP_014032/{name}"), SimpleFileOptions::default())
            .unwrap();
        w.write_all(&encode_band(band).unwrap()).unwrap();
    }
    w.finish().unwrap().into_inner()
}

fn landsat(red: &RasterBand, green: &RasterBand, nir: &RasterBand) -> Vec<u8> {
    archive(&[
        ("LC08_SR_B3.TIF", green),
        ("LC08_SR_B4.TIF", red),
        ("LC08_SR_B5.TIF", nir),
    ])
}

fn layer_pixels(sink: &MemorySink, title: &str) -> Vec<[u8; 4]> {
    let layer = sink
        .layers()
        .into_iter()
        .find(|l| l.title == title)
        .unwrap_or_else(|| panic!("no layer {title}"));
    layer
        .geo_image
        .image
        .as_raw()
        .chunks_exact(4)
        .map(|px| [px[0], px[1], px[2], px[3]])
        .collect()
}

fn setup() -> (Pipeline, MapSession, MemorySink) {
    let sink = MemorySink::new();
    let session = MapSession::new(sink.clone());
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    (pipeline, session, sink)
}

#[test]
fn uniform_vegetation_is_green() {
    let (pipeline, session, sink) = setup();
    let bytes = landsat(
        &utm_band("B4", 2, 100),
        &utm_band("B3", 2, 300),
        &utm_band("B5", 2, 200),
    );

    let token = session.begin_run();
    let report = pipeline.run(&bytes, &session, &token).unwrap();
    assert_eq!(report.published(), 2);

    assert_eq!(layer_pixels(&sink, "NDVI Layer"), vec![GREEN; 4]);
    // (300 - 200) / 500 = 0.2
    assert_eq!(layer_pixels(&sink, "NDWI Layer"), vec![BLUE; 4]);

    let layers = sink.layers();
    for layer in &layers {
        assert!(layer.visible);
        assert_eq!((layer.geo_image.image.width(), layer.geo_image.image.height()), (2, 2));
        assert_eq!(layer.geo_image.source_crs, CRS::utm(18, true));
        assert_eq!(layer.geo_image.display_crs, CRS::web_mercator());
        let e = layer.geo_image.extent;
        // Zone 18N easting 600 km, northing 4530 km: about 73.8°W, 40.9°N
        assert!(e.min_x > -8_250_000.0 && e.max_x < -8_150_000.0, "{e:?}");
        assert!(e.min_y > 4_950_000.0 && e.max_y < 5_050_000.0, "{e:?}");
        assert!(e.width() > 60.0 && e.width() < 100.0, "{e:?}");
    }

    let mut fits: Vec<Duration> = sink.fits().into_iter().map(|(_, f)| f.duration).collect();
    fits.sort();
    assert_eq!(fits, vec![Duration::from_millis(2000), Duration::from_millis(5000)]);
}

#[test]
fn missing_nir_publishes_nothing() {
    let (pipeline, session, sink) = setup();
    let bytes = archive(&[
        ("LC08_SR_B3.TIF", &utm_band("B3", 2, 300)),
        ("LC08_SR_B4.TIF", &utm_band("B4", 2, 100)),
    ]);

    let token = session.begin_run();
    let report = pipeline.run(&bytes, &session, &token).unwrap();
    assert_eq!(report.published(), 0);
    for kind in [IndexKind::Vegetation, IndexKind::Water] {
        match report.outcome(kind) {
            Some(KindOutcome::Failed(f)) => {
                assert_eq!(f.error_kind(), ErrorKind::MissingBand);
                assert_eq!(f.stage, Stage::Extract);
                assert_eq!(f.kind, Some(kind));
            }
            other => panic!("{kind}: unexpected {other:?}"),
        }
    }
    assert!(sink.layers().is_empty());
    assert!(sink.fits().is_empty());
}

#[test]
fn shape_mismatch_fails_only_the_affected_kind() {
    let (pipeline, session, sink) = setup();
    let bytes = landsat(
        &utm_band("B4", 2, 100),
        &utm_band("B3", 3, 300),
        &utm_band("B5", 3, 200),
    );

    let token = session.begin_run();
    let report = pipeline.run(&bytes, &session, &token).unwrap();

    match report.outcome(IndexKind::Vegetation) {
        Some(KindOutcome::Failed(f)) => {
            assert_eq!(f.stage, Stage::Validate);
            assert_eq!(f.error_kind(), ErrorKind::ShapeMismatch);
            assert_eq!(f.kind, Some(IndexKind::Vegetation));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(report.outcome(IndexKind::Water), Some(&KindOutcome::Published));
    assert_eq!(sink.titles(), vec!["NDWI Layer"]);
}

#[test]
fn shared_nir_mismatch_fails_both_kinds() {
    let (pipeline, session, sink) = setup();
    let bytes = landsat(
        &utm_band("B4", 2, 100),
        &utm_band("B3", 2, 300),
        &utm_band("B5", 3, 200),
    );

    let token = session.begin_run();
    let report = pipeline.run(&bytes, &session, &token).unwrap();
    assert_eq!(report.failures().count(), 2);
    assert!(report
        .failures()
        .all(|f| f.error_kind() == ErrorKind::ShapeMismatch));
    assert!(sink.layers().is_empty());
}

#[test]
fn zero_bands_take_fallback_colors() {
    let (pipeline, session, sink) = setup();
    let zeros = utm_band("B", 3, 0);
    let bytes = landsat(&zeros, &zeros, &zeros);

    let token = session.begin_run();
    let report = pipeline.run(&bytes, &session, &token).unwrap();
    assert_eq!(report.published(), 2);
    assert_eq!(layer_pixels(&sink, "NDVI Layer"), vec![BROWN; 9]);
    assert_eq!(layer_pixels(&sink, "NDWI Layer"), vec![WHITE; 9]);
}

#[test]
fn float_samples_are_rejected() {
    let (pipeline, session, sink) = setup();
    let red = RasterBand::new("B4", 2, 2, SampleBuffer::F32(vec![0.1; 4]))
        .with_crs(Some(CRS::utm(18, true)));
    let bytes = landsat(&red, &utm_band("B3", 2, 300), &utm_band("B5", 2, 200));

    let token = session.begin_run();
    let report = pipeline.run(&bytes, &session, &token).unwrap();
    match report.outcome(IndexKind::Vegetation) {
        Some(KindOutcome::Failed(f)) => assert_eq!(f.error_kind(), ErrorKind::InvalidSampleType),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(sink.titles(), vec!["NDWI Layer"]);
}

#[test]
fn corrupt_entry_is_a_decode_failure() {
    let (pipeline, session, _sink) = setup();
    let mut w = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in [
        ("B3.tif", encode_band(&utm_band("B3", 2, 1)).unwrap()),
        ("B4.tif", b"II*\0garbage".to_vec()),
        ("B5.tif", encode_band(&utm_band("B5", 2, 1)).unwrap()),
    ] {
        w.start_file(name, SimpleFileOptions::default()).unwrap();
        w.write_all(&body).unwrap();
    }
    let bytes = w.finish().unwrap().into_inner();

    let token = session.begin_run();
    let report = pipeline.run(&bytes, &session, &token).unwrap();
    match report.outcome(IndexKind::Vegetation) {
        Some(KindOutcome::Failed(f)) => assert_eq!(f.error_kind(), ErrorKind::Decode),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(report.outcome(IndexKind::Water), Some(&KindOutcome::Published));
}

#[test]
fn unreadable_archive_aborts_the_run() {
    let (pipeline, session, sink) = setup();
    let token = session.begin_run();
    let failure = pipeline.run(b"definitely not a zip", &session, &token).unwrap_err();
    assert_eq!(failure.stage, Stage::Extract);
    assert_eq!(failure.kind, None);
    assert_eq!(failure.error_kind(), ErrorKind::Archive);
    assert!(sink.layers().is_empty());
}

#[test]
fn bands_without_crs_use_the_fallback() {
    let (pipeline, session, sink) = setup();
    let plain = |v| {
        RasterBand::new("B", 2, 2, vec![v; 4])
            .with_transform(GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0))
    };
    let bytes = landsat(&plain(100), &plain(300), &plain(200));

    let token = session.begin_run();
    let report = pipeline.run(&bytes, &session, &token).unwrap();
    assert_eq!(report.published(), 2);
    for layer in sink.layers() {
        assert_eq!(layer.geo_image.source_crs.epsg(), 32618);
        // Central meridian of zone 18 is 75°W
        let (cx, _) = layer.geo_image.extent.center();
        assert_relative_eq!(cx, -8_348_961.8, max_relative = 1e-4);
    }
}

#[test]
fn stale_run_is_discarded() {
    let (pipeline, session, sink) = setup();
    let bytes = landsat(
        &utm_band("B4", 2, 100),
        &utm_band("B3", 2, 300),
        &utm_band("B5", 2, 200),
    );

    let first = session.begin_run();
    let second = session.begin_run();

    let stale = pipeline.run(&bytes, &session, &first).unwrap();
    assert_eq!(stale.superseded(), 2);
    assert!(sink.layers().is_empty());

    let fresh = pipeline.run(&bytes, &session, &second).unwrap();
    assert_eq!(fresh.published(), 2);
    assert_eq!(sink.layers().len(), 2);
}

#[test]
fn background_run_reports_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.zip");
    std::fs::write(
        &path,
        landsat(
            &utm_band("B4", 4, 100),
            &utm_band("B3", 4, 300),
            &utm_band("B5", 4, 200),
        ),
    )
    .unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    let sink = MemorySink::new();
    let session = Arc::new(MapSession::new(sink.clone()));
    let pipeline = Arc::new(Pipeline::new(PipelineConfig::default()).unwrap().with_events(tx));

    let (_token, handle) = spawn_run(
        pipeline,
        ArchiveSource::File(path),
        session.clone(),
    );
    let report = handle.join().unwrap().unwrap();
    assert_eq!(report.published(), 2);

    let events: Vec<PipelineEvent> = rx.try_iter().collect();
    assert!(events.contains(&PipelineEvent::RunFinished {
        published: 2,
        failed: 0
    }));
    let published = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::Published { .. }))
        .count();
    assert_eq!(published, 2);
    assert!(events.iter().any(|e| matches!(
        e,
        PipelineEvent::StageFinished {
            kind: None,
            stage: Stage::Fetch,
            ..
        }
    )));
}
