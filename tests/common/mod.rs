#![allow(dead_code)]

use keyed_dom::{
	arena::{Document, Mutation, NodeId},
	Reconciler,
};
use tracing::Level;

pub fn init_logging() {
	// Fails if another test in this binary already installed it, which is fine.
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(Level::TRACE).try_init();
}

pub fn reconciler() -> (Reconciler<Document>, NodeId) {
	init_logging();
	let mut document = Document::new();
	let root = document.create_root("main");
	(Reconciler::new(document), root)
}

pub fn created_count(mutations: &[Mutation]) -> usize {
	mutations.iter().filter(|mutation| matches!(mutation, Mutation::Create(_))).count()
}
