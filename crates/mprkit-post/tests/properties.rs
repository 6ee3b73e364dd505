use mprkit_core::{
    ArcDirection, CompensationKind, MotionCommand, NormalizedCommand, Point3, RawCommand,
};
use mprkit_post::{
    annotate, build_features, normalize, CompensationState, ElementGeometry, Feature,
};
use proptest::prelude::*;

fn raw_command() -> impl Strategy<Value = RawCommand> {
    let coord = -200.0f64..200.0;
    prop_oneof![
        (coord.clone(), coord.clone()).prop_map(|(x, y)| RawCommand::new("G1").with('X', x).with('Y', y)),
        (coord.clone(), coord.clone()).prop_map(|(x, y)| RawCommand::new("G0").with('X', x).with('Y', y)),
        (coord.clone(), coord.clone()).prop_map(|(x, y)| {
            RawCommand::new("G2").with('X', x).with('Y', y).with('I', 5.0).with('J', 0.0)
        }),
        Just(RawCommand::new("G2").with('X', 1.0)),
        Just(RawCommand::new("G41").with('D', 3.0)),
        Just(RawCommand::new("G42")),
        Just(RawCommand::new("G40")),
        Just(RawCommand::new("G17")),
        Just(RawCommand::new("M3").with('S', 12000.0)),
        Just(RawCommand::new("M6").with('T', 4.0)),
        Just(RawCommand::new("G1").with('F', -5.0)),
        Just(RawCommand::new("G81").with('X', 3.0)),
        Just(RawCommand::new("bogus")),
    ]
}

fn motion_command() -> impl Strategy<Value = MotionCommand> {
    let coord = -200.0f64..200.0;
    prop_oneof![
        4 => (coord.clone(), coord.clone()).prop_map(|(x, y)| MotionCommand::Line {
            end: Point3::new(x, y, 0.0),
            feed: Some(800.0),
        }),
        2 => (coord.clone(), coord.clone(), any::<bool>()).prop_map(|(x, y, cw)| MotionCommand::Arc {
            end: Point3::new(x, y, 0.0),
            center: Point3::new(x - 10.0, y, 0.0),
            radius: 10.0,
            direction: if cw { ArcDirection::Clockwise } else { ArcDirection::CounterClockwise },
            feed: Some(800.0),
        }),
        1 => (coord.clone(), coord).prop_map(|(x, y)| MotionCommand::Rapid {
            end: Point3::new(x, y, 0.0),
        }),
        1 => prop_oneof![
            Just(CompensationKind::Off),
            Just(CompensationKind::Left),
            Just(CompensationKind::Right),
        ]
        .prop_map(|kind| MotionCommand::CompensationDirective { kind, corrector: None }),
        1 => (1u32..4).prop_map(|number| MotionCommand::ToolChange { number }),
    ]
}

fn normalized(commands: Vec<MotionCommand>) -> Vec<NormalizedCommand> {
    commands
        .into_iter()
        .enumerate()
        .map(|(source_index, command)| NormalizedCommand {
            source_index,
            command,
            operation: None,
        })
        .collect()
}

/// Turn features back into a command stream that draws the same geometry
fn replay(features: &[Feature]) -> Vec<MotionCommand> {
    let mut commands = Vec::new();
    for feature in features {
        let Feature::Contour(contour) = feature else {
            continue;
        };
        commands.push(MotionCommand::ToolChange {
            number: contour.tool,
        });
        let (kind, corrector) = match contour.compensation {
            CompensationState::Off => (CompensationKind::Off, None),
            CompensationState::Left(d) => (CompensationKind::Left, Some(d)),
            CompensationState::Right(d) => (CompensationKind::Right, Some(d)),
        };
        commands.push(MotionCommand::CompensationDirective { kind, corrector });
        commands.push(MotionCommand::Rapid { end: contour.start });
        for element in &contour.elements {
            commands.push(match element.geometry {
                ElementGeometry::Line { end } => MotionCommand::Line {
                    end,
                    feed: contour.feed,
                },
                ElementGeometry::Arc {
                    end,
                    center,
                    radius,
                    direction,
                } => MotionCommand::Arc {
                    end,
                    center,
                    radius,
                    direction,
                    feed: contour.feed,
                },
            });
        }
    }
    commands
}

fn partition(features: &[Feature]) -> Vec<(usize, usize, CompensationState, u32)> {
    features
        .iter()
        .filter_map(|f| match f {
            Feature::Contour(c) => Some((c.line_count(), c.arc_count(), c.compensation, c.tool)),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_normalizer_preserves_count_and_order(raw in prop::collection::vec(raw_command(), 0..60)) {
        let stream = normalize(&raw);

        prop_assert_eq!(stream.accounted(), raw.len());
        prop_assert!(stream
            .commands
            .windows(2)
            .all(|w| w[0].source_index < w[1].source_index));

        let mut rejected: Vec<usize> = stream.rejected.iter().map(|e| e.index()).collect();
        rejected.extend(stream.commands.iter().map(|c| c.source_index));
        rejected.sort_unstable();
        prop_assert_eq!(rejected, (0..raw.len()).collect::<Vec<_>>());
    }

    #[test]
    fn prop_compensation_is_piecewise_constant(commands in prop::collection::vec(motion_command(), 0..80)) {
        let annotated = annotate(&normalized(commands), 101);

        let mut current = CompensationState::Off;
        let mut tool = 101;
        for cmd in &annotated {
            match &cmd.command {
                MotionCommand::ToolChange { number } => tool = *number,
                MotionCommand::CompensationDirective { kind, .. } => {
                    current = match kind {
                        CompensationKind::Off => CompensationState::Off,
                        CompensationKind::Left => CompensationState::Left(tool),
                        CompensationKind::Right => CompensationState::Right(tool),
                    };
                }
                _ => {}
            }
            prop_assert_eq!(cmd.compensation, current);
        }
    }

    #[test]
    fn prop_chaining_is_idempotent(commands in prop::collection::vec(motion_command(), 0..80)) {
        let first = build_features(&annotate(&normalized(commands), 101));
        let second = build_features(&annotate(&normalized(replay(&first)), 101));

        prop_assert_eq!(partition(&first), partition(&second));
        for (a, b) in first.iter().zip(&second) {
            if let (Feature::Contour(a), Feature::Contour(b)) = (a, b) {
                prop_assert_eq!(&a.elements, &b.elements);
                prop_assert_eq!(a.start, b.start);
            }
        }
    }

    #[test]
    fn prop_every_cutting_move_lands_in_one_feature(commands in prop::collection::vec(motion_command(), 0..80)) {
        let annotated = annotate(&normalized(commands), 101);
        let features = build_features(&annotated);

        let cutting = annotated
            .iter()
            .filter(|c| match &c.command {
                MotionCommand::Line { end, .. } => !end.approx_eq(&c.start),
                MotionCommand::Arc { .. } => true,
                _ => false,
            })
            .count();
        let elements: usize = features
            .iter()
            .map(|f| match f {
                Feature::Contour(c) => c.elements.len(),
                _ => 0,
            })
            .sum();
        prop_assert_eq!(cutting, elements);
    }
}
