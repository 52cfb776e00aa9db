#![no_main]

use cmdcenter_core::TaskIndex;
use cmdcenter_core::dataset::parse_dataset;
use cmdcenter_core::graph::hierarchy::hierarchy_depth;
use cmdcenter_core::validate::graph::validate_task_graph;
use cmdcenter_core::validate::validate_relationships_json;
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes as a dataset: every validator must return a report, never
// panic or recurse without bound on cyclic parent chains.
fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(dataset) = parse_dataset(content, "fuzz") else {
        return;
    };

    let tasks = dataset.tasks();
    let index = TaskIndex::new(&tasks);
    for record in &dataset.records {
        let report = validate_relationships_json(record, &index, 5);
        assert_eq!(report.valid, report.errors.is_empty());
    }
    for id in index.ids() {
        let _ = hierarchy_depth(id, &index, None);
    }

    let graph = validate_task_graph(&tasks);
    assert_eq!(graph.valid, graph.errors.is_empty());
    for cycle in &graph.cycles {
        assert_eq!(cycle.first(), cycle.last());
    }
});
