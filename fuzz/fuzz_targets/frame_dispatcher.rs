#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rtulink::server::{storage::ModbusStorageSmall, ModbusFrame};

#[derive(Debug, Arbitrary)]
struct FuzzInput<'a> {
    unit_id: u8,
    request: &'a [u8],
}

fuzz_target!(|input: FuzzInput| {
    // we only care about panics so results are ignored
    let mut ctx = ModbusStorageSmall::new();
    let mut response: Vec<u8> = Vec::new();
    let mut frame = ModbusFrame::new(input.unit_id, input.request, &mut response);
    if frame.parse().is_err() {
        return;
    }
    if frame.processing_required {
        let _ = if frame.readonly {
            frame.process_read(&ctx)
        } else {
            frame.process_write(&mut ctx)
        };
    }
    if frame.response_required {
        let _ = frame.finalize_response();
    }
});
