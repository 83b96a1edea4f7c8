use std::{cell::RefCell, rc::Rc};

use ifc_ngin::{ModelData, Viewer, ViewerConfig, ViewerUpdate, overlay::Overlay};
use serde_json::json;

use crate::common::test_utils::{ManualHost, init_logger, model};

mod common;

fn recorded(viewer: &mut Viewer) -> Rc<RefCell<Vec<ViewerUpdate>>> {
    let updates = Rc::new(RefCell::new(Vec::new()));
    let sink = updates.clone();
    viewer.subscribe(move |update| sink.borrow_mut().push(update.clone()));
    updates
}

#[test]
fn large_model_is_capped_at_the_render_budget() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default());
    let updates = recorded(&mut viewer);

    viewer
        .load(&mut host, model(&[("doors", 150), ("windows", 5)]))
        .unwrap();

    let status = viewer.status();
    assert!(status.is_ready);
    assert_eq!(status.placed_count, 100);
    assert_eq!(status.total_available, 155);
    assert!(status.truncated);
    assert_eq!(status.progress_percent, 100);
    assert!(
        viewer
            .placed_elements()
            .iter()
            .all(|element| element.category == "doors")
    );

    let progress: Vec<_> = updates
        .borrow()
        .iter()
        .filter_map(|update| match update {
            ViewerUpdate::Progress(progress) => Some(*progress),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 100);
    assert!(progress.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(progress.last().map(|p| p.percent), Some(100));
    assert!(matches!(
        updates.borrow().last(),
        Some(ViewerUpdate::Status(status)) if status.is_ready
    ));

    // only the door category was ever resolved
    let stats = host.stats();
    assert_eq!(stats.borrow().geometries, 1);
    assert_eq!(stats.borrow().materials, 1);

    viewer.teardown(&mut host);
}

#[test]
fn empty_category_gives_an_empty_ready_scene() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default());

    let model = ModelData::from_json(r#"{ "elements": { "walls": [] } }"#).unwrap();
    viewer.load(&mut host, model).unwrap();

    let status = viewer.status();
    assert!(status.is_ready);
    assert_eq!(status.placed_count, 0);
    assert_eq!(status.total_available, 0);
    assert!(!status.truncated);
    assert_eq!(status.progress_percent, 0);

    // the grid and axes are still drawn
    host.pump_frame(&mut viewer);
    let stats = host.stats();
    let frame = stats.borrow().last_frame.clone().unwrap();
    assert_eq!(frame.instances, 0);
    assert_eq!(frame.line_batches, 2);

    viewer.teardown(&mut host);
}

#[test]
fn missing_elements_object_is_an_empty_model() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default());

    let model = ModelData::from_value(json!({ "meta": { "schema": "IFC4" } }));
    viewer.load(&mut host, model).unwrap();

    assert!(viewer.is_ready());
    assert_eq!(viewer.status().placed_count, 0);
    viewer.teardown(&mut host);
}

#[test]
fn placed_count_never_exceeds_the_budget() {
    init_logger();
    let cases = [
        (1, vec![("walls", 3)]),
        (10, vec![("walls", 4), ("slabs", 6)]),
        (10, vec![("walls", 4), ("slabs", 7)]),
        (25, vec![("beams", 0), ("columns", 30)]),
        (100, vec![("walls", 99)]),
    ];
    for (budget, categories) in cases {
        let mut host = ManualHost::new(640, 480);
        let mut viewer = Viewer::new(ViewerConfig::default().with_max_renderable(budget));
        let model = model(&categories);
        let total = model.total_elements();

        viewer.load(&mut host, model).unwrap();

        let status = viewer.status();
        assert_eq!(status.placed_count, total.min(budget));
        assert_eq!(status.total_available, total);
        assert_eq!(status.truncated, total > budget);
        viewer.teardown(&mut host);
    }
}

#[test]
fn unknown_categories_fall_back_to_a_cube() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default());

    viewer
        .load(
            &mut host,
            model(&[("IfcFurnishingElement", 2), ("IfcFurnishingElement2", 1)]),
        )
        .unwrap();

    let placed = viewer.placed_elements();
    assert_eq!(placed.len(), 3);
    assert!(placed.iter().all(|e| e.base_colour.hex() == "#4caf50"));
    // both categories resolve to the same material, each to its own geometry
    let stats = host.stats();
    assert_eq!(stats.borrow().geometries, 2);
    assert_eq!(stats.borrow().materials, 1);
    viewer.teardown(&mut host);
}

#[test]
fn duplicate_identifiers_stay_unique() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default());
    let model = ModelData::empty().with_category(
        "walls",
        vec![
            json!({ "GlobalId": "2O2Fr$t4X7Zf8NOew3FLOH" }),
            json!({ "GlobalId": "2O2Fr$t4X7Zf8NOew3FLOH" }),
            json!({ "Name": "No id" }),
        ],
    );

    viewer.load(&mut host, model).unwrap();

    let ids: Vec<_> = viewer
        .placed_elements()
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec!["2O2Fr$t4X7Zf8NOew3FLOH", "2O2Fr$t4X7Zf8NOew3FLOH#2", "walls-2"]
    );
    viewer.teardown(&mut host);
}

#[test]
fn overlay_reports_legend_and_truncation() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default().with_max_renderable(10));

    assert_eq!(
        Overlay::from_viewer(&viewer).progress_label.as_deref(),
        Some("No model loaded")
    );

    viewer
        .load(&mut host, model(&[("walls", 6), ("doors", 8)]))
        .unwrap();
    let overlay = Overlay::from_viewer(&viewer);

    assert_eq!(overlay.progress_label, None);
    assert_eq!(
        overlay.truncation_notice.as_deref(),
        Some("Showing 10 of 14 elements")
    );
    let legend: Vec<_> = overlay
        .legend
        .iter()
        .map(|entry| (entry.category.as_str(), entry.colour.as_str(), entry.placed))
        .collect();
    assert_eq!(
        legend,
        vec![("walls", "#cccccc", 6), ("doors", "#8b4513", 4)]
    );
    assert_eq!(overlay.title(), "Showing 10 of 14 elements");

    viewer.highlight("doors-1");
    let overlay = Overlay::from_viewer(&viewer);
    assert_eq!(overlay.selection_label.as_deref(), Some("doors 1 (doors)"));
    assert_eq!(
        overlay.title(),
        "Showing 10 of 14 elements | doors 1 (doors)"
    );

    viewer.teardown(&mut host);
}

#[test]
fn overlay_follows_placement_progress() {
    init_logger();
    let mut host = ManualHost::new(800, 600);
    let mut viewer = Viewer::new(ViewerConfig::default().with_max_renderable(4));
    let labels = Rc::new(RefCell::new(Vec::new()));
    let sink = labels.clone();
    viewer.subscribe(move |update| {
        if let ViewerUpdate::Progress(progress) = update {
            sink.borrow_mut().push(Overlay::loading(progress).title());
        }
    });

    viewer.load(&mut host, model(&[("slabs", 4)])).unwrap();

    assert_eq!(
        *labels.borrow(),
        vec![
            "Loading 3D model... 25%",
            "Loading 3D model... 50%",
            "Loading 3D model... 75%",
            "Loading 3D model... 100%",
        ]
    );

    viewer.teardown(&mut host);
    assert_eq!(Overlay::from_viewer(&viewer).title(), "No model loaded");
}
