use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use uuid::Uuid;
use works_qtree_backend::models::{
    build_folder_tree, build_node_tree, excluded_destinations, folder_breadcrumbs, move_destinations,
    Folder, QTreeNode, RichTextDocument,
};

const SIZES: [usize; 3] = [100, 1_000, 10_000];
const FAN_OUT: usize = 4;

/// Folders in a complete tree of the given fan-out, parents before children.
fn folders(count: usize) -> Vec<Folder> {
    let now = Utc::now();
    let mut folders: Vec<Folder> = Vec::with_capacity(count);
    for i in 0..count {
        let parent_id = if i == 0 { None } else { Some(folders[(i - 1) / FAN_OUT].id) };
        folders.push(Folder {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            parent_id,
            name: format!("folder-{}", i),
            created_at: now,
            updated_at: now,
        });
    }
    folders
}

fn nodes(root_id: Uuid, count: usize) -> Vec<QTreeNode> {
    let now = Utc::now();
    let answer = RichTextDocument(json!({
        "type": "doc",
        "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "answer" }] }]
    }));

    let mut nodes: Vec<QTreeNode> = Vec::with_capacity(count);
    for i in 0..count {
        let (parent_root_id, parent_node_id) = if i < FAN_OUT {
            (Some(root_id), None)
        } else {
            (None, Some(nodes[i / FAN_OUT - 1].id))
        };
        nodes.push(QTreeNode {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            qtree_root_id: root_id,
            parent_root_id,
            parent_node_id,
            question: format!("question {}", i),
            answer: answer.clone(),
            created_at: now,
            updated_at: now,
        });
    }
    nodes
}

fn bench_folder_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("folder_tree");
    for size in SIZES {
        let data = folders(size);
        group.bench_with_input(BenchmarkId::new("build", size), &data, |b, data| {
            b.iter(|| build_folder_tree(black_box(data)))
        });

        let deepest = data[size - 1].id;
        group.bench_with_input(BenchmarkId::new("breadcrumbs", size), &data, |b, data| {
            b.iter(|| folder_breadcrumbs(black_box(data), deepest))
        });
    }
    group.finish();
}

fn bench_move_destinations(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_destinations");
    for size in SIZES {
        let data = folders(size);
        let tree = build_folder_tree(&data);
        let moved = data[1].id;

        group.bench_with_input(BenchmarkId::new("picker", size), &tree, |b, tree| {
            b.iter(|| move_destinations(black_box(tree), Some(moved)))
        });
        group.bench_with_input(BenchmarkId::new("excluded", size), &data, |b, data| {
            b.iter(|| excluded_destinations(black_box(data), moved))
        });
    }
    group.finish();
}

fn bench_node_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_tree");
    let root_id = Uuid::new_v4();
    for size in SIZES {
        let data = nodes(root_id, size);
        group.bench_with_input(BenchmarkId::new("build", size), &data, |b, data| {
            b.iter(|| build_node_tree(root_id, black_box(data)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_folder_tree, bench_move_destinations, bench_node_tree);
criterion_main!(benches);
