#![no_main]

use libfuzzer_sys::fuzz_target;

use feur::autoreply::{resolve, AutoReplyEngine, ScriptedRandom, TriggerTable};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Arbitrary answer maps must either be rejected or decode into a table
    // whose answers all resolve without panicking.
    let raw = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };
    let table = match TriggerTable::from_json_str(raw) {
        Ok(t) => t,
        Err(_) => return,
    };

    let random = ScriptedRandom::constant(0.999);
    for entry in table.iter() {
        let _ = resolve(&entry.config.answer, &random);
    }

    let engine = AutoReplyEngine::new(Arc::new(table));
    let message: String = engine
        .table()
        .iter()
        .map(|e| e.trigger.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let _ = engine.compose(&message);
});
