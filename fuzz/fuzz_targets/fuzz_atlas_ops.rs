#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quadatlas::AtlasAllocator;

#[derive(Debug, Arbitrary)]
enum Op {
    Load { key: u8, width: u16, height: u16 },
    Release { key: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    page_size: u16,
    min_size: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let page_size = (input.page_size % 512) as u32;
    let mut atlas = match AtlasAllocator::new(page_size, input.min_size as u32) {
        Ok(atlas) => atlas,
        Err(_) => return,
    };

    for op in input.ops.iter().take(256) {
        match *op {
            Op::Load { key, width, height } => {
                let (w, h) = (width as u32 % 600, height as u32 % 600);
                let pixels = vec![key; w as usize * h as usize * 4];
                let before = atlas.stats();
                if let Err(err) = atlas.load(&format!("k{}", key), w, h, &pixels) {
                    // Rejected requests leave the atlas exactly as it was
                    assert!(err.is_request_error(), "{}", err);
                    assert_eq!(atlas.stats(), before);
                }
            }
            Op::Release { key } => {
                let _ = atlas.release(&format!("k{}", key));
            }
        }
    }

    let stats = atlas.stats();
    assert_eq!(stats.used_area + stats.free_area, stats.total_area());
    assert!(atlas.manifest().validate().is_ok());
});
