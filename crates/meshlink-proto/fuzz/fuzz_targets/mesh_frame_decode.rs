#![no_main]

use libfuzzer_sys::fuzz_target;
use meshlink_proto::{Elements, MeshHeader, MgmtFrame};

fuzz_target!(|data: &[u8]| {
    // Header decode must reject, never panic, on any input
    if let Ok(header) = MeshHeader::from_bytes(data) {
        assert!(header.encoded_len() <= data.len());
        let reencoded = header.to_bytes();
        assert_eq!(&reencoded[..], &data[..reencoded.len()]);
    }

    // Element parsing over arbitrary regions
    let elems = Elements::parse(data);
    let _ = elems.ds_channel();
    let _ = elems.has_rsn();

    // Management frame views
    if let Ok(frame) = MgmtFrame::parse(data) {
        let _ = frame.subtype();
        let _ = frame.action();
        if let Some(ies) = frame.beacon_elements() {
            let _ = Elements::parse(ies);
        }
    }
});
