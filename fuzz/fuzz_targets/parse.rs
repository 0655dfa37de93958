#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut doc) = cini::Document::with_options(
        cini::Options::default()
            .initial_capacity(256)
            .memory_limit(Some(1 << 24)),
    ) else {
        return;
    };
    let result = doc.parse_bytes(data);
    assert_eq!(result.is_err(), !doc.diagnostics().is_empty());

    // Every section must be reachable again through its own path.
    for section in doc.sections() {
        let mut current = doc.root();
        let mut chain = Vec::new();
        let mut walk = Some(section);
        while let Some(s) = walk.filter(|s| !s.is_root()) {
            chain.push(s.name());
            walk = s.parent();
        }
        for name in chain.iter().rev() {
            current = current.child(name).expect("child lookup lost a section");
        }
        assert_eq!(current.id(), section.id());

        let found = doc
            .find_section(&section.full_name())
            .expect("full name does not resolve");
        assert_eq!(found.id(), section.id());
    }
    std::hint::black_box(&doc);
});
