//! # Instance Set Properties
//!
//! Verifies the buffer/argument consistency guarantees against the recording host:
//!
//! 1. **Draw args**: `instance_count` follows the position count, the index count never changes
//! 2. **Rebuild**: identical input gives identical bytes; a new count leaves no old buffer bound
//! 3. **Lifecycle**: first-frame draw is a no-op, shutdown is idempotent
//! 4. **Length invariant**: strict rejection vs. best-effort hazard
//!
//! Run with: cargo test -p swarm_core --test instance_set_properties

use std::sync::Arc;

use swarm_core::recording::{
    BufferId, HostEvent, RecordingHost, RecordingMaterial, RecordingMesh,
};
use swarm_core::{
    share_material, AttributeKind, BufferDescriptor, BufferPolicy, BufferUsage, Color, DrawArgs, DrawOutcome, InstanceArrays,
    InstanceLayout, InstanceSet, InstancingConfig, InstancingError, LengthPolicy, SetState, Vec3,
};

const INDEX_COUNT: u32 = 36;

fn new_set(config: InstancingConfig) -> InstanceSet<RecordingHost> {
    InstanceSet::new(
        config,
        Arc::new(RecordingMesh::new(vec![INDEX_COUNT])),
        share_material(RecordingMaterial::default()),
    )
    .expect("mesh has submesh 0")
}

fn line(n: usize) -> Vec<Vec3> {
    (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect()
}

fn bound(set: &InstanceSet<RecordingHost>, kind: AttributeKind) -> Option<BufferId> {
    set.material().read().binding(kind.slot())
}

// ============================================================================
// DRAW ARGUMENTS
// ============================================================================

#[test]
fn instance_count_follows_positions() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::for_layout(InstanceLayout::Colored));

    for n in [0usize, 1, 3, 17, 1000, 2] {
        let positions = line(n);
        let colors = vec![Color::WHITE; n];
        set.update_view(&mut host, &InstanceArrays::colored(&positions, &colors))
            .unwrap();

        let args_buffer = *set.args_buffer().buffer().unwrap();
        let args = host.read_as::<DrawArgs>(args_buffer);
        assert_eq!(args, vec![DrawArgs::new(INDEX_COUNT, n as u32)]);
        assert_eq!(set.draw_args().index_count_per_instance, INDEX_COUNT);
        assert!(set.is_consistent());
    }

    set.shutdown(&mut host);
}

#[test]
fn three_white_instances_on_a_line() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::for_layout(InstanceLayout::Colored));
    let positions = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
    ];
    let colors = [Color::WHITE; 3];

    set.update_view(&mut host, &InstanceArrays::colored(&positions, &colors))
        .unwrap();
    let outcome = set.draw(&mut host).unwrap();

    assert_eq!(outcome, DrawOutcome::Submitted { instance_count: 3 });
    assert_eq!(set.draw_args(), DrawArgs::new(INDEX_COUNT, 3));

    let position_buffer = bound(&set, AttributeKind::Position).unwrap();
    assert_eq!(host.read_as::<Vec3>(position_buffer), positions.to_vec());

    let draws = host.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].args.instance_count, 3);
    assert_eq!(draws[0].submesh_index, 0);
    assert_eq!(draws[0].bindings.len(), 2);

    set.shutdown(&mut host);
    assert!(host.violations().is_empty());
}

#[test]
fn three_transformed_instances_on_a_line() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::for_layout(InstanceLayout::Transformed));
    let positions = line(3);
    let rotations = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 45.0, 0.0),
        Vec3::new(90.0, 0.0, 180.0),
    ];
    let sizes = [Vec3::splat(1.0), Vec3::new(2.0, 1.0, 0.5), Vec3::splat(0.25)];
    let colors = [
        Color::WHITE,
        Color::rgb(1.0, 0.0, 0.0),
        Color::rgb(0.0, 0.5, 1.0),
    ];

    set.update_view(
        &mut host,
        &InstanceArrays::transformed(&positions, &rotations, &sizes, &colors),
    )
    .unwrap();
    let outcome = set.draw(&mut host).unwrap();
    assert_eq!(outcome, DrawOutcome::Submitted { instance_count: 3 });

    let read_vec3 = |kind| host.read_as::<Vec3>(bound(&set, kind).unwrap());
    assert_eq!(read_vec3(AttributeKind::Position), positions);
    assert_eq!(read_vec3(AttributeKind::Rotation), rotations.to_vec());
    assert_eq!(read_vec3(AttributeKind::Size), sizes.to_vec());
    let color_buffer = bound(&set, AttributeKind::Color).unwrap();
    assert_eq!(host.read_as::<Color>(color_buffer), colors.to_vec());

    let draws = host.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].args, DrawArgs::new(INDEX_COUNT, 3));
    assert_eq!(draws[0].bindings.len(), 4);
    for kind in AttributeKind::ALL {
        let id = draws[0].bindings[&kind.slot()];
        assert_eq!(host.descriptor(id).map(|d| d.element_count), Some(3), "{kind}");
    }

    set.shutdown(&mut host);
    assert!(host.violations().is_empty());
}

#[test]
fn zero_instances_still_draw() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::for_layout(InstanceLayout::Colored));

    set.update_view(&mut host, &InstanceArrays::colored(&[], &[]))
        .unwrap();
    let outcome = set.draw(&mut host).unwrap();

    assert_eq!(outcome, DrawOutcome::Submitted { instance_count: 0 });
    assert_eq!(host.draws()[0].args.instance_count, 0);
    set.shutdown(&mut host);
}

// ============================================================================
// REBUILD
// ============================================================================

#[test]
fn identical_updates_produce_identical_bytes() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::for_layout(InstanceLayout::Transformed));
    let positions = line(8);
    let rotations = vec![Vec3::new(0.0, 90.0, 0.0); 8];
    let sizes = vec![Vec3::splat(2.0); 8];
    let colors = vec![Color::rgb(1.0, 0.0, 0.5); 8];
    let arrays = InstanceArrays::transformed(&positions, &rotations, &sizes, &colors);

    set.update_view(&mut host, &arrays).unwrap();
    let first: Vec<(AttributeKind, BufferId, Vec<u8>)> = AttributeKind::ALL
        .iter()
        .map(|&k| {
            let id = bound(&set, k).unwrap();
            (k, id, host.buffer(id).unwrap().data.clone())
        })
        .collect();

    set.update_view(&mut host, &arrays).unwrap();
    for (kind, old_id, old_bytes) in first {
        let new_id = bound(&set, kind).unwrap();
        // Fresh allocation, same contents
        assert_ne!(new_id, old_id, "{kind} was not reallocated");
        assert_eq!(host.buffer(new_id).unwrap().data, old_bytes, "{kind} differs");
    }

    set.shutdown(&mut host);
}

#[test]
fn rebuild_leaves_no_stale_buffer_bound() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::for_layout(InstanceLayout::Colored));

    let positions = line(4);
    let colors = vec![Color::WHITE; 4];
    set.update_view(&mut host, &InstanceArrays::colored(&positions, &colors))
        .unwrap();
    let old_position = bound(&set, AttributeKind::Position).unwrap();
    let old_color = bound(&set, AttributeKind::Color).unwrap();

    let positions = line(9);
    let colors = vec![Color::BLACK; 9];
    set.update_view(&mut host, &InstanceArrays::colored(&positions, &colors))
        .unwrap();
    set.draw(&mut host).unwrap();

    assert!(!host.is_live(old_position));
    assert!(!host.is_live(old_color));
    for id in set.material().read().bindings().values() {
        assert!(host.is_live(*id));
        assert_eq!(host.descriptor(*id).unwrap().element_count, 9);
    }
    assert!(host.violations().is_empty());

    set.shutdown(&mut host);
}

#[test]
fn args_rebuilt_before_attributes() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::for_layout(InstanceLayout::Colored));
    let positions = line(2);
    let colors = vec![Color::WHITE; 2];

    set.update_view(&mut host, &InstanceArrays::colored(&positions, &colors))
        .unwrap();

    let args_id = *set.args_buffer().buffer().unwrap();
    assert_eq!(host.events().first(), Some(&HostEvent::Allocate(args_id)));
    assert_eq!(host.descriptor(args_id), Some(BufferDescriptor::indirect(20)));

    for kind in [AttributeKind::Position, AttributeKind::Color] {
        let id = bound(&set, kind).unwrap();
        let descriptor = host.descriptor(id).unwrap();
        assert_eq!(descriptor.usage, BufferUsage::Structured, "{kind}");
        assert_eq!(descriptor.element_count, 2, "{kind}");
    }

    set.draw(&mut host).unwrap();
    assert!(host.violations().is_empty());
    set.shutdown(&mut host);
}

#[test]
fn grow_only_policy_keeps_buffers_consistent() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig {
        buffer_policy: BufferPolicy::GrowOnly,
        ..InstancingConfig::for_layout(InstanceLayout::Colored)
    });

    for n in [10usize, 4, 16, 3] {
        let positions = line(n);
        let colors = vec![Color::WHITE; n];
        set.update_view(&mut host, &InstanceArrays::colored(&positions, &colors))
            .unwrap();
        set.draw(&mut host).unwrap();
        assert!(set.is_consistent());
        assert_eq!(host.draws().last().unwrap().args.instance_count, n as u32);
    }

    // 10 → 16 capacity, 4 fits, 16 fits, 3 fits: one allocation per buffer
    assert_eq!(set.stats().buffers_allocated, 3);
    set.shutdown(&mut host);
    assert_eq!(host.live_buffer_count(), 0);
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn draw_before_update_submits_nothing() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::default());

    assert_eq!(set.draw(&mut host), Ok(DrawOutcome::Uninitialized));
    assert_eq!(set.draw(&mut host), Ok(DrawOutcome::Uninitialized));
    assert!(host.draws().is_empty());
    assert_eq!(set.stats().draws_skipped, 2);
}

#[test]
fn shutdown_twice_is_harmless() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::default());
    let positions = line(3);
    let colors = vec![Color::WHITE; 3];
    set.update_view(&mut host, &InstanceArrays::colored(&positions, &colors))
        .unwrap();

    set.shutdown(&mut host);
    set.shutdown(&mut host);

    assert_eq!(set.state(), SetState::Released);
    assert_eq!(host.live_buffer_count(), 0);
    assert!(host.violations().is_empty());
    assert_eq!(set.stats().live_buffers(), 0);
}

#[test]
fn shutdown_before_any_update() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::default());

    set.shutdown(&mut host);

    assert_eq!(set.state(), SetState::Released);
    assert!(host.events().is_empty());
}

#[test]
fn allocation_failure_invalidates_frame() {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig::for_layout(InstanceLayout::Colored));
    let positions = line(3);
    let colors = vec![Color::WHITE; 3];
    let arrays = InstanceArrays::colored(&positions, &colors);

    set.update_view(&mut host, &arrays).unwrap();
    set.draw(&mut host).unwrap();

    // Args allocation succeeds, the first attribute allocation fails
    host.clear_events();
    host.fail_allocation_after(1);
    let result = set.update_view(&mut host, &arrays);
    assert!(matches!(result, Err(InstancingError::ResourceExhaustion { .. })));

    assert_eq!(set.draw(&mut host), Ok(DrawOutcome::InvalidFrame));
    assert!(host.draws().is_empty());

    // The failed attribute's old buffer is gone but still bound: never drawn with
    let stale = bound(&set, AttributeKind::Color).unwrap();
    assert!(!host.is_live(stale));

    // Next frame recovers
    set.update_view(&mut host, &arrays).unwrap();
    assert_eq!(
        set.draw(&mut host),
        Ok(DrawOutcome::Submitted { instance_count: 3 })
    );
    assert!(host.violations().is_empty());
    set.shutdown(&mut host);
}

// ============================================================================
// LENGTH INVARIANT
// ============================================================================

fn mismatched_transformed(policy: LengthPolicy) -> (InstanceSet<RecordingHost>, RecordingHost) {
    let mut host = RecordingHost::new();
    let mut set = new_set(InstancingConfig {
        length_policy: policy,
        ..InstancingConfig::for_layout(InstanceLayout::Transformed)
    });
    let positions = line(5);
    let rotations = vec![Vec3::ZERO; 3];
    let sizes = vec![Vec3::ONE; 5];
    let colors = vec![Color::WHITE; 5];

    let result = set.update_view(
        &mut host,
        &InstanceArrays::transformed(&positions, &rotations, &sizes, &colors),
    );
    if policy == LengthPolicy::Strict {
        assert_eq!(
            result,
            Err(InstancingError::LengthMismatch {
                attribute: AttributeKind::Rotation,
                expected: 5,
                actual: 3,
            })
        );
    } else {
        assert!(result.is_ok());
    }
    (set, host)
}

#[test]
fn strict_policy_rejects_mismatch_before_touching_buffers() {
    let (mut set, mut host) = mismatched_transformed(LengthPolicy::Strict);

    assert!(host.events().is_empty());
    assert_eq!(set.state(), SetState::Uninitialized);
    assert_eq!(set.draw(&mut host), Ok(DrawOutcome::Uninitialized));
}

#[test]
fn best_effort_policy_reproduces_hazard() {
    let (mut set, mut host) = mismatched_transformed(LengthPolicy::BestEffort);

    assert_eq!(set.draw_args().instance_count, 5);
    assert_eq!(set.attribute(AttributeKind::Rotation).map(|b| b.len()), Some(3));
    assert!(!set.is_consistent());

    set.draw(&mut host).unwrap();
    set.shutdown(&mut host);
}
