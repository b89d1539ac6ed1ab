use std::fs;
use std::path::PathBuf;

use std::sync::Arc;
use std::time::Duration;

use figure_rotator::controller::SlideshowController;
use figure_rotator::error::Error;
use figure_rotator::events::VisibilityChanged;
use figure_rotator::host::{DirectoryHost, FigureHost};
use figure_rotator::timer::ManualTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;
use tokio::sync::mpsc;

fn touch(path: &PathBuf) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"x").unwrap();
}

#[test]
fn lists_images_recursively_in_path_order() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let b = root.join("b.png");
    let a = root.join("a.JPG");
    let nested = root.join("nested/c.webp");
    touch(&b);
    touch(&a);
    touch(&nested);
    touch(&root.join("notes.txt"));

    let host = DirectoryHost::new(&root);
    assert_eq!(host.root(), root.as_path());
    assert_eq!(host.figures().unwrap(), vec![a, b, nested]);
}

#[test]
fn reflects_membership_changes_between_queries() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let first = root.join("first.jpg");
    touch(&first);

    let host = DirectoryHost::new(&root);
    assert_eq!(host.figures().unwrap().len(), 1);

    let second = root.join("second.jpeg");
    touch(&second);
    assert_eq!(host.figures().unwrap(), vec![first.clone(), second]);

    fs::remove_file(&first).unwrap();
    assert_eq!(host.figures().unwrap().len(), 1);
}

#[test]
fn missing_library_is_reported() {
    let dir = tempdir().unwrap();
    let host = DirectoryHost::new(dir.path().join("absent"));
    assert!(matches!(host.figures(), Err(Error::BadLibrary(_))));

    let file = dir.path().join("plain.jpg");
    touch(&file);
    let host = DirectoryHost::new(&file);
    assert!(matches!(host.figures(), Err(Error::BadLibrary(_))));
}

#[test]
fn publishes_only_marker_flips() {
    let (tx, mut rx) = mpsc::channel::<VisibilityChanged>(8);
    let mut host = DirectoryHost::new("/unused").with_events(tx);
    let a = PathBuf::from("/unused/a.jpg");
    let b = PathBuf::from("/unused/b.jpg");

    host.set_visible(&a, false);
    host.set_visible(&a, true);
    host.set_visible(&a, true);
    host.set_visible(&b, false);
    host.set_visible(&a, false);
    host.set_visible(&b, true);

    let mut changes = Vec::new();
    while let Ok(change) = rx.try_recv() {
        changes.push(change);
    }
    assert_eq!(
        changes,
        vec![
            VisibilityChanged { path: a.clone(), visible: true },
            VisibilityChanged { path: a.clone(), visible: false },
            VisibilityChanged { path: b.clone(), visible: true },
        ]
    );
    assert!(host.is_visible(&b));
    assert!(!host.is_visible(&a));
}

fn drain(rx: &mut mpsc::Receiver<VisibilityChanged>) -> Vec<VisibilityChanged> {
    let mut changes = Vec::new();
    while let Ok(change) = rx.try_recv() {
        changes.push(change);
    }
    changes
}

#[test]
fn figure_removed_while_visible_is_hidden_and_republished_on_return() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let a = root.join("a.jpg");
    let b = root.join("b.jpg");
    touch(&a);
    touch(&b);

    let (tx, mut rx) = mpsc::channel::<VisibilityChanged>(32);
    let mut controller = SlideshowController::new(
        DirectoryHost::new(&root).with_events(tx),
        ManualTimer::new(),
        Duration::from_secs(10),
        StdRng::seed_from_u64(17),
        Arc::new(|_: u64| {}),
    );

    controller.start().unwrap();
    let (shown, other) = if controller.host().is_visible(&a) {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    };
    drain(&mut rx);

    fs::remove_file(&shown).unwrap();
    controller.show().unwrap();
    let changes = drain(&mut rx);
    assert!(changes.contains(&VisibilityChanged { path: shown.clone(), visible: false }));
    assert!(changes.contains(&VisibilityChanged { path: other.clone(), visible: true }));
    assert!(!controller.host().is_visible(&shown));

    touch(&shown);
    fs::remove_file(&other).unwrap();
    controller.show().unwrap();
    let changes = drain(&mut rx);
    assert!(
        changes.contains(&VisibilityChanged { path: shown.clone(), visible: true }),
        "returning figure must be published as visible: {changes:?}"
    );
    assert!(changes.contains(&VisibilityChanged { path: other.clone(), visible: false }));
    assert!(controller.host().is_visible(&shown));
    assert!(!controller.host().is_visible(&other));
}
