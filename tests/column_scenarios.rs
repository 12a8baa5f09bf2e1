use std::rc::Rc;

use pageflow::{
  BreakValue, ChunkPosition, Column, ForcedBreakKind, LayoutContext, NodePosition, StyledHandle,
  StyledNodeBuilder, ViewFactory,
};

fn init_logs() {
  let _ = env_logger::builder().is_test(true).try_init();
}

fn tall_flow(boxes: usize) -> StyledHandle {
  let mut builder = StyledNodeBuilder::element("flow");
  for i in 0..boxes {
    builder = builder.child(
      StyledNodeBuilder::element(&format!("b{}", i + 1))
        .extent(1.0)
        .build(),
    );
  }
  builder.build()
}

fn fresh_fill(root: &StyledHandle, budget: f32) -> (Rc<ViewFactory>, Column) {
  let factory = Rc::new(ViewFactory::new(root));
  let column = Column::new(&factory.view_root(), factory.clone(), budget);
  (factory, column)
}

fn run_fill(column: &Column, chunk: &ChunkPosition, leading_edge: bool) -> Option<ChunkPosition> {
  column
    .layout(chunk, leading_edge)
    .value()
    .expect("layout resolves synchronously over a ready context")
    .expect("layout succeeds")
}

#[test]
fn flow_paginates_across_three_containers() {
  init_logs();
  let root = tall_flow(7);

  let mut chunk = ChunkPosition::at_flow_start(&root);
  let mut extents = Vec::new();
  loop {
    let (factory, column) = fresh_fill(&root, 3.0);
    let resume = run_fill(&column, &chunk, true);
    if resume.is_none() {
      extents.push(factory.view_root().subtree_extent());
      break;
    }
    let found = column
      .find_acceptable_break_position()
      .expect("a fitting edge was recorded before the overflow");
    column
      .finish_break(&found.node_context, false, true)
      .value()
      .unwrap()
      .unwrap();
    column.do_finish_break_of_fragment_layout_constraints(Some(&found.node_context));
    extents.push(factory.view_root().subtree_extent());
    chunk = ChunkPosition::new(found.node_context.to_node_position());
  }

  assert_eq!(
    extents,
    vec![3.0, 3.0, 1.0],
    "seven unit boxes under a budget of three fill three containers"
  );
}

#[test]
fn forced_break_starts_a_new_container_without_refiring() {
  init_logs();
  let root = StyledNodeBuilder::element("flow")
    .child(StyledNodeBuilder::element("b1").extent(1.0).build())
    .child(
      StyledNodeBuilder::element("b2")
        .break_before(BreakValue::Forced(ForcedBreakKind::Page))
        .child(StyledNodeBuilder::element("c").extent(1.0).build())
        .build(),
    )
    .child(StyledNodeBuilder::element("b3").extent(1.0).build())
    .build();

  let (factory, column) = fresh_fill(&root, 10.0);
  let resume = run_fill(&column, &ChunkPosition::at_flow_start(&root), true)
    .expect("the forced break stops the first fill");

  assert_eq!(
    column.forced_break_kind(),
    Some(ForcedBreakKind::Page),
    "the break kind survives for the container assembly to act on"
  );
  assert_eq!(resume.primary.node.name(), "b2");
  assert!(!resume.primary.after, "the flow resumes before the broken box");
  assert_eq!(
    factory.view_root().subtree_extent(),
    1.0,
    "the view of the box broken before must leave the first container"
  );
  assert!(
    column.find_acceptable_break_position().is_none(),
    "a forced break needs no recorded soft break"
  );

  // Second container: the same break-before edge is now the leading edge and
  // must not fire again.
  let (factory, column) = fresh_fill(&root, 10.0);
  let resume = run_fill(&column, &ChunkPosition::new(resume.primary), true);

  assert!(resume.is_none(), "the rest of the flow fits");
  assert!(column.forced_break_kind().is_none());
  assert_eq!(
    factory.view_root().subtree_extent(),
    2.0,
    "the second container holds the broken box's subtree and the tail box"
  );
}

#[test]
fn soft_values_annotate_records_and_forced_values_stop() {
  init_logs();
  let root = StyledNodeBuilder::element("flow")
    .child(StyledNodeBuilder::element("b1").extent(1.0).build())
    .child(
      StyledNodeBuilder::element("b2")
        .extent(1.0)
        .break_before(BreakValue::Allowed)
        .build(),
    )
    .child(
      StyledNodeBuilder::element("b3")
        .extent(1.0)
        .break_before(BreakValue::Forced(ForcedBreakKind::Column))
        .build(),
    )
    .build();

  let (factory, column) = fresh_fill(&root, 10.0);
  let resume = run_fill(&column, &ChunkPosition::at_flow_start(&root), true)
    .expect("the forced break stops the fill");

  assert_eq!(
    factory.view_root().subtree_extent(),
    2.0,
    "the box broken before leaves the container even though it would fit"
  );
  let records = column.break_positions();
  assert_eq!(records.len(), 1, "only the edge before b2 was recorded");
  assert_eq!(records[0].position.source.name(), "b1");
  assert!(records[0].position.after);
  assert_eq!(
    records[0].break_on_edge,
    Some(BreakValue::Allowed),
    "the soft value crossing the edge is kept with the record"
  );
  assert_eq!(column.forced_break_kind(), Some(ForcedBreakKind::Column));
  assert_eq!(resume.primary.node.name(), "b3");
}

#[test]
fn trailing_overflow_resumes_at_the_flow_end_position() {
  init_logs();
  let root = StyledNodeBuilder::element("flow")
    .child(StyledNodeBuilder::element("b1").extent(1.0).build())
    .child(StyledNodeBuilder::element("b2").extent(3.0).build())
    .build();

  let (_factory, column) = fresh_fill(&root, 3.0);
  let resume = run_fill(&column, &ChunkPosition::at_flow_start(&root), true)
    .expect("the flow ran out while overflowing, so the fill does not report completion");
  assert_eq!(resume.primary.node.name(), "flow");
  assert!(resume.primary.after);

  let found = column
    .find_acceptable_break_position()
    .expect("the edge after b1 fits");
  assert_eq!(found.node_context.source.name(), "b1");

  // Everything left moves to a second container where it fits exactly.
  let (factory, column) = fresh_fill(&root, 3.0);
  let resume = run_fill(
    &column,
    &ChunkPosition::new(found.node_context.to_node_position()),
    true,
  );
  assert!(resume.is_none(), "a box ending exactly at the budget fits");
  assert_eq!(factory.view_root().subtree_extent(), 3.0);
}

#[test]
fn empty_wrappers_share_one_break_record() {
  init_logs();
  let root = StyledNodeBuilder::element("flow")
    .child(StyledNodeBuilder::element("b1").extent(1.0).build())
    .child(
      StyledNodeBuilder::element("w")
        .child(StyledNodeBuilder::element("w2").build())
        .build(),
    )
    .child(StyledNodeBuilder::element("b2").extent(1.0).build())
    .build();

  let (_factory, column) = fresh_fill(&root, 10.0);
  let resume = run_fill(&column, &ChunkPosition::at_flow_start(&root), true);
  assert!(resume.is_none());

  let records = column.break_positions();
  let names: Vec<(&str, bool)> = records
    .iter()
    .map(|record| (record.position.source.name(), record.position.after))
    .collect();
  assert_eq!(
    names,
    vec![("b1", true), ("w", true), ("flow", true)],
    "nested start edges collapse onto the record of the edge before them"
  );
}

#[test]
fn resumed_ancestors_do_not_recount_their_extent() {
  init_logs();
  let root = StyledNodeBuilder::element("flow")
    .extent(0.5)
    .child(StyledNodeBuilder::element("b1").extent(1.0).build())
    .child(StyledNodeBuilder::element("b2").extent(1.0).build())
    .build();

  let (factory, column) = fresh_fill(&root, 10.0);
  let resume = run_fill(&column, &ChunkPosition::at_flow_start(&root), true);
  assert!(resume.is_none());
  assert_eq!(
    factory.view_root().subtree_extent(),
    2.5,
    "a fresh fill counts the flow root's own extent"
  );

  // Resume below the root: the reopened root contributes no extent of its own
  // to the continuation container.
  let b1 = root.first_child().unwrap();
  let (factory, column) = fresh_fill(&root, 10.0);
  let resume = run_fill(&column, &ChunkPosition::new(NodePosition::after(&b1)), true);
  assert!(resume.is_none());
  assert_eq!(
    factory.view_root().subtree_extent(),
    1.0,
    "only the content after the resume position occupies the container"
  );
}
