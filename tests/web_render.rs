#![cfg(all(target_arch = "wasm32", feature = "web"))]

use keyed_dom::{build, web::WebTree, Reconciler, Teardown};
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn init_logging() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
}

fn fresh_container() -> HtmlElement {
	let document = window().unwrap().document().unwrap();
	let container = document.create_element("div").unwrap().dyn_into::<HtmlElement>().unwrap();
	document.body().unwrap().append_child(&container).unwrap();
	container
}

#[wasm_bindgen_test]
fn keyed_reorder() {
	init_logging();
	let container = fresh_container();
	let tree = WebTree::from_window().unwrap();
	let root = tree.attach(&container);
	let mut reconciler = Reconciler::new(tree);

	let order = Rc::new(RefCell::new(vec!["a", "b", "c"]));
	{
		let order = Rc::clone(&order);
		reconciler
			.render(root, move |context, _| {
				for &key in order.borrow().iter() {
					build::element(context, key, "li", |context, _| build::text(context, (), key).map(drop))?;
				}
				Ok(())
			})
			.unwrap();
	}
	assert_eq!(container.inner_html(), "<li>a</li><li>b</li><li>c</li>");
	let first = container.first_child().unwrap();

	*order.borrow_mut() = vec!["c", "a"];
	reconciler.rerender(root).unwrap();
	assert_eq!(container.inner_html(), "<li>c</li><li>a</li>");
	assert!(container.last_child().unwrap().is_same_node(Some(&first)));
}

#[wasm_bindgen_test]
fn server_markup_is_adopted() {
	init_logging();
	let container = fresh_container();
	let html = keyed_dom::write::<()>(|context| {
		build::element(context, (), "p", |context, _| {
			build::attr(context, "class", "intro")?;
			build::text(context, (), "Hello")?;
			Ok(())
		})?;
		Ok(())
	})
	.unwrap();
	container.set_inner_html(&html);
	let p = container.first_child().unwrap();

	let tree = WebTree::from_window().unwrap();
	let root = tree.attach(&container);
	let mut reconciler = Reconciler::new(tree);
	let created = Rc::new(RefCell::new(0));
	{
		let created = Rc::clone(&created);
		reconciler
			.render(root, move |context, _| {
				let created = Rc::clone(&created);
				build::element(context, (), "p", move |context, _| {
					build::attr(context, "class", "intro")?;
					build::text(context, (), "Hello")?;
					build::created(context, move |_| {
						*created.borrow_mut() += 1;
						Ok(Teardown::Nothing)
					});
					Ok(())
				})?;
				Ok(())
			})
			.unwrap();
	}

	assert!(container.first_child().unwrap().is_same_node(Some(&p)));
	assert_eq!(container.inner_html(), html);
	assert_eq!(*created.borrow(), 1);
}

#[wasm_bindgen_test]
fn handles_are_released_and_reused() {
	init_logging();
	let container = fresh_container();
	let tree = WebTree::from_window().unwrap();
	let root = tree.attach(&container);
	let mut reconciler = Reconciler::new(tree);

	let shown = Rc::new(RefCell::new(true));
	{
		let shown = Rc::clone(&shown);
		reconciler
			.render(root, move |context, _| {
				build::element(context, "kept", "p", |context, _| build::text(context, (), "kept").map(drop))?;
				if *shown.borrow() {
					build::element(context, "toggled", "ul", |context, _| {
						for key in ["a", "b", "c"] {
							build::element(context, key, "li", |context, _| build::text(context, (), key).map(drop))?;
						}
						Ok(())
					})?;
				}
				Ok(())
			})
			.unwrap();
	}
	let full = reconciler.tree().live_handles();

	*shown.borrow_mut() = false;
	reconciler.rerender(root).unwrap();
	let pruned = reconciler.tree().live_handles();
	assert_eq!(container.inner_html(), "<p>kept</p>");
	assert_eq!(full - pruned, 7);

	for _ in 0..5 {
		*shown.borrow_mut() = true;
		reconciler.rerender(root).unwrap();
		assert_eq!(reconciler.tree().live_handles(), full);

		*shown.borrow_mut() = false;
		reconciler.rerender(root).unwrap();
		assert_eq!(reconciler.tree().live_handles(), pruned);
	}
}
