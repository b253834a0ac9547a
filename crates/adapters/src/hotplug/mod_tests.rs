// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn classifies_created_nodes_as_added_devices() {
    let mut event = Event::new(EventKind::Create(notify::event::CreateKind::File));
    event = event.add_path(PathBuf::from("/dev/bus/usb/001/004"));

    let hotplug = classify(&event).unwrap();
    assert_eq!(hotplug.action, HotplugAction::Add);
    assert_eq!(hotplug.device_type, USB_DEVICE_TYPE);
    assert_eq!(hotplug.node, PathBuf::from("/dev/bus/usb/001/004"));
}

#[test]
fn classifies_removed_nodes_as_removed_devices() {
    let mut event = Event::new(EventKind::Remove(notify::event::RemoveKind::File));
    event = event.add_path(PathBuf::from("/dev/bus/usb/001/004"));

    assert_eq!(classify(&event).unwrap().action, HotplugAction::Remove);
}

#[test]
fn ignores_other_filesystem_events() {
    let mut event = Event::new(EventKind::Modify(notify::event::ModifyKind::Any));
    event = event.add_path(PathBuf::from("/dev/bus/usb/001/004"));

    assert!(classify(&event).is_none());
}

#[test]
fn monitor_observes_created_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut monitor = UsbMonitor::watch_path(dir.path()).unwrap();

    std::fs::write(dir.path().join("001"), b"").unwrap();

    // The notify backend may emit intermediate events; scan until the
    // creation shows up.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    let mut added = false;
    while std::time::Instant::now() < deadline {
        match monitor.recv_timeout(Duration::from_millis(200)) {
            Ok(Some(event)) if event.action == HotplugAction::Add => {
                added = true;
                break;
            }
            Ok(_) => {}
            Err(e) => panic!("monitor failed: {e}"),
        }
    }
    assert!(added, "no add event observed");
}

#[test]
fn fake_monitor_delivers_pushed_events() {
    let (mut monitor, tx) = FakeMonitor::new();

    tx.send(HotplugEvent {
        action: HotplugAction::Add,
        device_type: USB_DEVICE_TYPE.to_string(),
        node: PathBuf::from("/dev/bus/usb/001/002"),
    })
    .unwrap();

    let event = monitor.recv_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(event.unwrap().action, HotplugAction::Add);

    // Nothing pending: times out without an event.
    let none = monitor.recv_timeout(Duration::from_millis(10)).unwrap();
    assert!(none.is_none());
}
