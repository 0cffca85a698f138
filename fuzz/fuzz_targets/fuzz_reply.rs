//! Fuzz target for the reply parser and reply shapers.
//!
//! Arbitrary bytes go through the RESP parser; every frame it accepts is fed
//! to each shaper. Nothing here may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use viator_modules::RespParser;
use viator_modules::codec::{RedisCodec, StringCodec};
use viator_modules::reply::{self, search, timeseries};

fuzz_target!(|data: &[u8]| {
    let codec: &dyn RedisCodec<String, String> = &StringCodec;
    let mut parser = RespParser::new();
    parser.extend(data);

    while let Ok(Some(frame)) = parser.parse() {
        let _ = reply::ok(frame.clone());
        let _ = reply::count(frame.clone());
        let _ = timeseries::sample(frame.clone());
        let _ = timeseries::samples(frame.clone());
        let _ = timeseries::range_results(codec, frame.clone());
        let _ = timeseries::get_results(codec, frame.clone());
        let _ = timeseries::timestamps(frame.clone());
        let _ = timeseries::info(frame.clone());
        let _ = timeseries::keys(codec, frame.clone());
        let _ = search::aggregate_results(codec, frame.clone());
        let _ = search::aggregate_with_cursor_results(codec, frame);
    }
});
