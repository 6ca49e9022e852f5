mod common;

use common::{created_count, reconciler};
use keyed_dom::{
	arena::{Mutation, NodeId},
	build, AttrValue, Context, CreationOptions, ElementDescriptor, Key, RenderError, Tree, SVG_NAMESPACE,
};
use std::{cell::Cell, rc::Rc};

fn keyed_divs(context: &mut dyn Context<NodeId>, keys: &[&str]) -> Result<(), RenderError> {
	for &key in keys {
		build::element(context, key, "div", |context, _| build::text(context, (), key).map(drop))?;
	}
	Ok(())
}

#[test]
fn reordering_reuses_keyed_nodes() {
	let (mut reconciler, root) = reconciler();
	reconciler.render(root, |context, _| keyed_divs(context, &["a", "b"])).unwrap();
	let before = reconciler.tree().children(root).to_vec();
	reconciler.tree_mut().take_mutations();

	reconciler.render(root, |context, _| keyed_divs(context, &["b", "a"])).unwrap();
	assert_eq!(reconciler.tree().children(root), [before[1], before[0]]);
	assert_eq!(created_count(&reconciler.tree_mut().take_mutations()), 0);
	assert_eq!(reconciler.tree().inner_html(root), "<div>b</div><div>a</div>");
	assert_eq!(reconciler.key_of(before[0]), Some(&Key::from("a")));
}

#[test]
fn identical_pass_is_idempotent() {
	let (mut reconciler, root) = reconciler();
	let view = |context: &mut dyn Context<NodeId>, _: NodeId| -> Result<(), RenderError> {
		build::comment(context, (), "list")?;
		build::element(context, "list", "ul", |context, _| {
			build::attrs(context, [("class", AttrValue::from("items")), ("hidden", AttrValue::from(true))])?;
			for i in 0..3_i64 {
				build::element(context, i, "li", |context, _| {
					build::attr(context, "data-index", i.to_string())?;
					build::number(context, (), 1.5 * i as f64)?;
					Ok(())
				})?;
			}
			Ok(())
		})?;
		build::markup_element(context, (), "div", "<b>raw</b>")?;
		Ok(())
	};

	reconciler.render(root, view).unwrap();
	assert!(!reconciler.tree_mut().take_mutations().is_empty());

	reconciler.rerender(root).unwrap();
	assert!(reconciler.tree_mut().take_mutations().is_empty());
}

#[test]
fn unclaimed_children_are_pruned() {
	let (mut reconciler, root) = reconciler();
	let removed = Rc::new(Cell::new(0));

	let view = {
		let removed = Rc::clone(&removed);
		move |keys: &'static [&'static str]| {
			let removed = Rc::clone(&removed);
			move |context: &mut dyn Context<NodeId>, _: NodeId| -> Result<(), RenderError> {
				for &key in keys {
					let removed = Rc::clone(&removed);
					build::element(context, key, "li", move |context, _| {
						let inner_removed = Rc::clone(&removed);
						build::removed(context, move |_| {
							removed.set(removed.get() + 1);
							Ok(())
						});
						build::element(context, (), "span", move |context, _| {
							build::removed(context, move |_| {
								inner_removed.set(inner_removed.get() + 1);
								Ok(())
							});
							Ok(())
						})?;
						Ok(())
					})?;
				}
				Ok(())
			}
		}
	};

	reconciler.render(root, view(&["a", "b", "c"])).unwrap();
	let kept = reconciler.tree().children(root)[0];
	assert_eq!(removed.get(), 0);

	reconciler.render(root, view(&["a"])).unwrap();
	assert_eq!(reconciler.tree().children(root), [kept]);
	assert_eq!(removed.get(), 4);

	reconciler.render(root, view(&["a"])).unwrap();
	assert_eq!(removed.get(), 4);
}

#[test]
fn removed_subtrees_are_released() {
	let (mut reconciler, root) = reconciler();
	let view = |keys: &'static [&'static str]| {
		move |context: &mut dyn Context<NodeId>, _: NodeId| -> Result<(), RenderError> {
			for &key in keys {
				build::element(context, key, "li", |context, _| build::text(context, (), key).map(drop))?;
			}
			Ok(())
		}
	};

	reconciler.render(root, view(&["a", "b"])).unwrap();
	let items = reconciler.tree().children(root).to_vec();
	let texts: Vec<NodeId> = items.iter().map(|&item| reconciler.tree().children(item)[0]).collect();

	reconciler.render(root, view(&["a"])).unwrap();
	assert!(!reconciler.tree().is_released(items[0]));
	assert!(!reconciler.tree().is_released(texts[0]));
	assert!(reconciler.tree().is_released(items[1]));
	assert!(reconciler.tree().is_released(texts[1]));

	reconciler.render(root, view(&["a", "b"])).unwrap();
	let readded = reconciler.tree().children(root)[1];
	assert_ne!(readded, items[1]);
	assert!(!reconciler.tree().is_released(readded));

	reconciler
		.render(root, |context, _| build::element(context, "a", "p", |_, _| Ok(())).map(drop))
		.unwrap();
	assert!(reconciler.tree().is_released(items[0]));
	assert!(reconciler.tree().is_released(texts[0]));
	assert!(reconciler.tree().is_released(readded));
	assert!(!reconciler.tree().is_released(reconciler.tree().children(root)[0]));
}

#[test]
fn tag_mismatch_replaces_the_node() {
	let (mut reconciler, root) = reconciler();
	let removed = Rc::new(Cell::new(0));
	let cleaned_up = Rc::new(Cell::new(0));

	{
		let removed = Rc::clone(&removed);
		let cleaned_up = Rc::clone(&cleaned_up);
		reconciler
			.render(root, move |context, _| {
				let removed = Rc::clone(&removed);
				let cleaned_up = Rc::clone(&cleaned_up);
				build::element(context, "x", "div", move |context, _| {
					build::removed(context, move |_| {
						removed.set(removed.get() + 1);
						Ok(())
					});
					build::cleanup(context, move |_| {
						cleaned_up.set(cleaned_up.get() + 1);
						Ok(())
					});
					Ok(())
				})
				.map(drop)
			})
			.unwrap();
	}
	let old = reconciler.tree().children(root)[0];
	reconciler.tree_mut().take_mutations();

	reconciler
		.render(root, |context, _| build::element(context, "x", "span", |_, _| Ok(())).map(drop))
		.unwrap();
	let new = reconciler.tree().children(root)[0];
	assert_ne!(old, new);
	assert_eq!((removed.get(), cleaned_up.get()), (1, 1));
	assert!(reconciler.tree_mut().take_mutations().contains(&Mutation::Replace {
		parent: root,
		new_child: new,
		old_child: old,
	}));
	assert_eq!(reconciler.key_of(old), None);
	assert_eq!(reconciler.key_of(new), Some(&Key::from("x")));

	reconciler
		.render(root, |context, _| build::element(context, "x", "span", |_, _| Ok(())).map(drop))
		.unwrap();
	assert_eq!((removed.get(), cleaned_up.get()), (1, 1));
}

#[test]
fn html_tag_names_match_case_insensitively() {
	let (mut reconciler, root) = reconciler();
	reconciler.render(root, |context, _| build::element(context, (), "DIV", |_, _| Ok(())).map(drop)).unwrap();
	let first = reconciler.tree().children(root)[0];
	reconciler.render(root, |context, _| build::element(context, (), "div", |_, _| Ok(())).map(drop)).unwrap();
	assert_eq!(reconciler.tree().children(root), [first]);
}

#[test]
fn foreign_tag_names_are_case_sensitive() {
	let (mut reconciler, root) = reconciler();
	let view = |tag_name: &'static str| move |context: &mut dyn Context<NodeId>, _: NodeId| build::element_ns(context, (), SVG_NAMESPACE, tag_name, |_, _| Ok(())).map(drop);
	reconciler.render(root, view("foreignObject")).unwrap();
	let first = reconciler.tree().children(root)[0];
	reconciler.render(root, view("foreignObject")).unwrap();
	assert_eq!(reconciler.tree().children(root), [first]);
	reconciler.render(root, view("foreignobject")).unwrap();
	assert_ne!(reconciler.tree().children(root), [first]);
}

#[test]
fn custom_element_designator_is_part_of_identity() {
	let (mut reconciler, root) = reconciler();
	reconciler.tree_mut().define_custom_element("fancy-button");
	let view = |is: &'static str| {
		move |context: &mut dyn Context<NodeId>, _: NodeId| -> Result<(), RenderError> {
			context.push_element(ElementDescriptor::new("button").with_is(is).with_content(|context, _| build::attr(context, "is", "ignored")))?;
			Ok(())
		}
	};

	reconciler.render(root, view("fancy-button")).unwrap();
	let first = reconciler.tree().children(root)[0];
	assert_eq!(reconciler.tree().is_value(first).as_deref(), Some("fancy-button"));
	assert_eq!(reconciler.tree().attribute(first, "is"), None);
	assert_eq!(reconciler.tree().outer_html(first), r#"<button is="fancy-button"></button>"#);

	reconciler.render(root, view("fancy-button")).unwrap();
	assert_eq!(reconciler.tree().children(root), [first]);

	reconciler.render(root, view("plain-button")).unwrap();
	assert_ne!(reconciler.tree().children(root), [first]);
}

#[test]
fn attributes_are_reconciled() {
	let (mut reconciler, root) = reconciler();
	reconciler
		.render(root, |context, _| {
			build::element(context, (), "input", |context, _| {
				build::attr(context, "Class", "a")?;
				build::attr(context, "title", "t")?;
				build::attr(context, "checked", true)?;
				build::attr(context, "  ", "blank names are ignored")?;
				Ok(())
			})
			.map(drop)
		})
		.unwrap();
	let input = reconciler.tree().children(root)[0];
	assert_eq!(reconciler.tree().outer_html(input), r#"<input class="a" title="t" checked />"#);

	reconciler
		.render(root, |context, _| {
			build::element(context, (), "input", |context, _| {
				build::attr(context, "CLASS", "b")?;
				build::attr(context, "checked", false)?;
				Ok(())
			})
			.map(drop)
		})
		.unwrap();
	assert_eq!(reconciler.tree().children(root), [input]);
	assert_eq!(reconciler.tree().outer_html(input), r#"<input class="b" />"#);
}

#[test]
fn unchanged_attributes_are_not_written() {
	let (mut reconciler, root) = reconciler();
	let view = |context: &mut dyn Context<NodeId>, _: NodeId| {
		build::element(context, (), "a", |context, _| {
			build::attr(context, "HREF", "/")?;
			build::attr_ns(context, "http://www.w3.org/1999/xlink", "xlink:title", "home")?;
			Ok(())
		})
		.map(drop)
	};
	reconciler.render(root, view).unwrap();
	reconciler.tree_mut().take_mutations();
	reconciler.rerender(root).unwrap();
	assert!(reconciler.tree_mut().take_mutations().is_empty());
}

#[test]
fn remove_attr_removes_immediately() {
	let (mut reconciler, _) = reconciler();
	let target = reconciler.tree_mut().create_root("p");
	reconciler.tree_mut().set_attribute(target, None, "title", "foreign").unwrap();
	reconciler.tree_mut().set_attribute(target, None, "lang", "en").unwrap();

	reconciler
		.render(target, |context, _| {
			build::remove_attr(context, "title")?;
			build::attr(context, "lang", "en")?;
			Ok(())
		})
		.unwrap();
	assert_eq!(reconciler.tree().attribute(target, "title"), None);
	assert_eq!(reconciler.tree().attribute(target, "lang"), Some("en"));
}

#[test]
fn unkeyed_foreign_nodes_are_adopted() {
	let (mut reconciler, root) = reconciler();
	let tree = reconciler.tree_mut();
	let p = tree.create_element("p", None, &CreationOptions::new()).unwrap();
	let text = tree.create_text_node("hello").unwrap();
	let comment = tree.create_comment("note").unwrap();
	tree.insert_before(p, text, None).unwrap();
	tree.insert_before(root, comment, None).unwrap();
	tree.insert_before(root, p, None).unwrap();
	tree.take_mutations();

	reconciler
		.render(root, |context, _| {
			build::element(context, "paragraph", "p", |context, _| build::text(context, (), "hello").map(drop))?;
			build::comment(context, (), "note")?;
			Ok(())
		})
		.unwrap();

	assert_eq!(created_count(&reconciler.tree_mut().take_mutations()), 0);
	assert_eq!(reconciler.tree().children(root), [p, comment]);
	assert_eq!(reconciler.tree().children(p), [text]);
	assert_eq!(reconciler.key_of(p), Some(&Key::from("paragraph")));
	assert_eq!(reconciler.key_of(comment), Some(&Key::Int(1)));
}

#[test]
fn repeated_keys_update_in_place() {
	let (mut reconciler, root) = reconciler();
	reconciler
		.render(root, |context, _| {
			let first = build::text(context, "t", "first")?;
			let second = build::text(context, "t", "second")?;
			assert_eq!(first, second);
			Ok(())
		})
		.unwrap();
	assert_eq!(reconciler.tree().child_count(root), 1);
	assert_eq!(reconciler.tree().inner_html(root), "second");
}

#[test]
fn empty_text_claims_no_key() {
	let (mut reconciler, root) = reconciler();
	reconciler
		.render(root, |context, _| {
			assert_eq!(build::text(context, (), "")?, None);
			assert_eq!(build::comment(context, (), "")?, None);
			build::text(context, (), "x")?;
			Ok(())
		})
		.unwrap();
	let text = reconciler.tree().children(root)[0];
	assert_eq!(reconciler.tree().child_count(root), 1);
	assert_eq!(reconciler.key_of(text), Some(&Key::Int(0)));
}

#[test]
fn positional_and_integer_keys_share_identity() {
	let (mut reconciler, root) = reconciler();
	reconciler
		.render(root, |context, _| {
			build::text(context, (), "positional")?;
			build::text(context, 0, "explicit")?;
			Ok(())
		})
		.unwrap();
	assert_eq!(reconciler.tree().inner_html(root), "explicit");
}

#[test]
fn character_data_is_updated_in_place() {
	let (mut reconciler, root) = reconciler();
	let label = Rc::new(Cell::new("one"));
	{
		let label = Rc::clone(&label);
		reconciler.render(root, move |context, _| build::text(context, (), label.get()).map(drop)).unwrap();
	}
	let text = reconciler.tree().children(root)[0];
	reconciler.tree_mut().take_mutations();

	label.set("two");
	reconciler.rerender(root).unwrap();
	assert_eq!(reconciler.tree().children(root), [text]);
	assert_eq!(reconciler.tree_mut().take_mutations(), [Mutation::SetData(text)]);
}

#[test]
fn markup_content_is_assigned_wholesale() {
	let (mut reconciler, root) = reconciler();
	let markup = Rc::new(Cell::new(None::<&'static str>));
	let removed = Rc::new(Cell::new(0));
	{
		let markup = Rc::clone(&markup);
		let removed = Rc::clone(&removed);
		reconciler
			.render(root, move |context, _| {
				match markup.get() {
					Some(markup) => build::markup_element(context, (), "div", markup)?,
					None => {
						let removed = Rc::clone(&removed);
						build::element(context, (), "div", move |context, _| {
							build::element(context, (), "span", move |context, _| {
								build::removed(context, move |_| {
									removed.set(removed.get() + 1);
									Ok(())
								});
								Ok(())
							})
							.map(drop)
						})?
					}
				};
				Ok(())
			})
			.unwrap();
	}
	let div = reconciler.tree().children(root)[0];
	assert_eq!(reconciler.tree().inner_html(div), "<span></span>");
	let span = reconciler.tree().children(div)[0];

	markup.set(Some("<b>raw</b>"));
	reconciler.rerender(root).unwrap();
	assert_eq!(reconciler.tree().children(root), [div]);
	assert_eq!(reconciler.tree().inner_html(root), "<div><b>raw</b></div>");
	assert_eq!(removed.get(), 1);
	assert!(reconciler.tree().is_released(span));
	reconciler.tree_mut().take_mutations();

	reconciler.rerender(root).unwrap();
	assert!(reconciler.tree_mut().take_mutations().is_empty());

	markup.set(Some("<i>other</i>"));
	reconciler.rerender(root).unwrap();
	assert_eq!(reconciler.tree_mut().take_mutations(), [Mutation::SetMarkup(div)]);
}
