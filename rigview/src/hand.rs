//! The hand rig: a wrist base, a palm, a two-segment thumb and four
//! three-segment fingers. Every joint sits at the tip of the previous segment
//! and rotates in place.

use glam::Vec3;
use rigview_types::PartId;

use crate::hierarchy::{HierarchyError, NodeIndex, PivotConvention, PivotTree, Rotation};

/// Scale of the wrist base segment.
pub const BASE_SCALE: Vec3 = Vec3::new(1.0, 0.5, 1.0);
/// Scale of the palm segment.
pub const PALM_SCALE: Vec3 = Vec3::new(3.8, 3.0, 1.0);
/// Scale of both thumb segments.
pub const THUMB_SCALE: Vec3 = Vec3::new(0.7, 1.3, 0.7);
/// Resting abduction of the thumb, degrees.
pub const THUMB_REST_Z_DEGREES: f32 = 20.0;
/// Gap between the palm's edge and the thumb pivot.
const THUMB_GAP: f32 = 0.7;
/// Inset of the outer fingers from the palm's edge.
const FINGER_INSET: f32 = 0.6;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Digit {
    Index,
    Middle,
    Ring,
    Small,
}

impl Digit {
    pub const ALL: [Self; 4] = [Self::Index, Self::Middle, Self::Ring, Self::Small];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Small => "small",
        }
    }

    /// Scale of each of the digit's three segments.
    pub const fn segment_scale(self) -> Vec3 {
        match self {
            Self::Index | Self::Ring => Vec3::new(0.6, 0.9, 0.6),
            Self::Middle => Vec3::new(0.6, 1.1, 0.6),
            Self::Small => Vec3::new(0.6, 0.7, 0.6),
        }
    }

    /// Sideways spread of the digit per radian of the fingers control.
    pub const fn spread_factor(self) -> f32 {
        match self {
            Self::Index => 1.5,
            Self::Middle => 0.7,
            Self::Ring => -0.7,
            Self::Small => -1.5,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// One of a finger's three joints. `Joint3` is the knuckle on the palm and
/// `Joint1` the joint nearest the fingertip.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Knuckle {
    Joint1,
    Joint2,
    Joint3,
}

impl Knuckle {
    pub const ALL: [Self; 3] = [Self::Joint1, Self::Joint2, Self::Joint3];

    /// Position of the joint along the finger, from the palm outwards.
    const fn segment(self) -> usize {
        match self {
            Self::Joint3 => 0,
            Self::Joint2 => 1,
            Self::Joint1 => 2,
        }
    }

    const fn number(self) -> u8 {
        match self {
            Self::Joint1 => 1,
            Self::Joint2 => 2,
            Self::Joint3 => 3,
        }
    }
}

/// Every continuous control of the hand. Values are given in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum JointControl {
    WristTwist,
    WristBend,
    /// Flex of the thumb at the palm.
    ThumbJoint1,
    /// Abduction of the thumb at the palm, measured from its resting angle.
    ThumbJoint2,
    /// Flex of the outer thumb segment.
    ThumbMiddle,
    Finger(Digit, Knuckle),
    /// Spreads all digits apart.
    FingersSpread,
}

impl JointControl {
    pub fn all() -> Vec<Self> {
        let mut all = vec![
            Self::WristTwist,
            Self::WristBend,
            Self::ThumbJoint1,
            Self::ThumbJoint2,
            Self::ThumbMiddle,
        ];
        for digit in Digit::ALL {
            for knuckle in Knuckle::ALL {
                all.push(Self::Finger(digit, knuckle));
            }
        }
        all.push(Self::FingersSpread);
        all
    }

    /// Control name as typed on the command line, e.g. `index-joint1`.
    pub fn name(self) -> String {
        match self {
            Self::WristTwist => "wrist-twist".into(),
            Self::WristBend => "wrist-bend".into(),
            Self::ThumbJoint1 => "thumb-joint1".into(),
            Self::ThumbJoint2 => "thumb-joint2".into(),
            Self::ThumbMiddle => "thumb-middle".into(),
            Self::Finger(digit, knuckle) => format!("{}-joint{}", digit.name(), knuckle.number()),
            Self::FingersSpread => "fingers".into(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|control| control.name() == name)
    }

    /// Range the input layer allows, in degrees.
    pub fn range_degrees(self) -> (f32, f32) {
        match self {
            Self::WristTwist => (0.0, 360.0),
            Self::WristBend => (-45.0, 45.0),
            Self::FingersSpread => (0.0, 10.0),
            _ => (0.0, 45.0),
        }
    }

    pub fn clamp_degrees(self, degrees: f32) -> f32 {
        let (min, max) = self.range_degrees();
        degrees.clamp(min, max)
    }
}

/// A drawable segment of the hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandSegment {
    pub node: NodeIndex,
    pub part: PartId,
}

#[derive(Debug, Clone)]
pub struct HandRig {
    tree: PivotTree,
    palm: NodeIndex,
    thumb: NodeIndex,
    thumb_middle: NodeIndex,
    fingers: [[NodeIndex; 3]; 4],
    segments: Vec<HandSegment>,

    thumb_joint_x: f32,
    thumb_joint_z: f32,
    thumb_spread_x: f32,
    thumb_spread_z: f32,
}

impl HandRig {
    pub fn new() -> Result<Self, HierarchyError> {
        let mut tree = PivotTree::new();
        let mut segments = Vec::new();

        let base = tree.add_root("base", PivotConvention::at(Vec3::new(0.0, BASE_SCALE.y, 0.0)));
        attach_segment(&mut tree, &mut segments, base, "base segment".into(), Vec3::ZERO, BASE_SCALE)?;

        let palm = tree.add_child(base, "palm", PivotConvention::at(Vec3::new(0.0, BASE_SCALE.y, 0.0)))?;
        attach_segment(&mut tree, &mut segments, palm, "palm segment".into(), lifted(PALM_SCALE), PALM_SCALE)?;

        let thumb = tree.add_child(
            palm,
            "thumb",
            PivotConvention::at(Vec3::new(-PALM_SCALE.x - THUMB_GAP, PALM_SCALE.y / 1.5, 0.0)),
        )?;
        attach_segment(&mut tree, &mut segments, thumb, "thumb segment".into(), lifted(THUMB_SCALE), THUMB_SCALE)?;
        let thumb_middle = tree.add_child(
            thumb,
            "thumb middle",
            PivotConvention::at(Vec3::new(0.0, THUMB_SCALE.y * 2.0, 0.0)),
        )?;
        attach_segment(
            &mut tree,
            &mut segments,
            thumb_middle,
            "thumb middle segment".into(),
            lifted(THUMB_SCALE),
            THUMB_SCALE,
        )?;

        // Knuckles are spread evenly between the two inset outer fingers.
        let first_x = -PALM_SCALE.x + FINGER_INSET;
        let spacing = (PALM_SCALE.x - FINGER_INSET) * 2.0 / 3.0;
        let mut fingers = [[NodeIndex(0); 3]; 4];
        for (i, digit) in Digit::ALL.into_iter().enumerate() {
            let scale = digit.segment_scale();
            let mut parent = palm;
            let mut offset = Vec3::new(first_x + spacing * i as f32, PALM_SCALE.y * 2.0, 0.0);
            for (j, joint) in fingers[digit.index()].iter_mut().enumerate() {
                let pivot = tree.add_child(parent, format!("{} {j}", digit.name()), PivotConvention::at(offset))?;
                let label = format!("{} {j} segment", digit.name());
                attach_segment(&mut tree, &mut segments, pivot, label, lifted(scale), scale)?;
                *joint = pivot;
                parent = pivot;
                offset = Vec3::new(0.0, scale.y * 2.0, 0.0);
            }
        }

        let mut rig = Self {
            tree,
            palm,
            thumb,
            thumb_middle,
            fingers,
            segments,
            thumb_joint_x: 0.0,
            thumb_joint_z: THUMB_REST_Z_DEGREES.to_radians(),
            thumb_spread_x: 0.0,
            thumb_spread_z: 0.0,
        };
        rig.update_thumb()?;
        Ok(rig)
    }

    pub fn tree(&self) -> &PivotTree {
        &self.tree
    }

    /// Drawable segments, all sharing the unit cylinder mesh.
    pub fn segments(&self) -> &[HandSegment] {
        &self.segments
    }

    /// Pivot node of a finger joint.
    pub fn finger_joint(&self, digit: Digit, knuckle: Knuckle) -> NodeIndex {
        self.fingers[digit.index()][knuckle.segment()]
    }

    pub fn thumb(&self) -> NodeIndex {
        self.thumb
    }

    /// Current Euler angles of the thumb pivot, radians.
    pub fn thumb_rotation(&self) -> Vec3 {
        Vec3::new(
            self.thumb_joint_x + self.thumb_spread_x,
            0.0,
            self.thumb_joint_z + self.thumb_spread_z,
        )
    }

    /// Sets a control to `degrees`. The value is not clamped here; that's the
    /// input layer's job.
    pub fn set_joint(&mut self, control: JointControl, degrees: f32) -> Result<(), HierarchyError> {
        let radians = degrees.to_radians();
        match control {
            JointControl::WristTwist => self.set_euler(self.palm, |e| e.y = radians),
            JointControl::WristBend => self.set_euler(self.palm, |e| e.x = -radians),
            JointControl::ThumbJoint1 => {
                self.thumb_joint_x = -radians;
                self.update_thumb()
            }
            JointControl::ThumbJoint2 => {
                self.thumb_joint_z = THUMB_REST_Z_DEGREES.to_radians() - radians;
                self.update_thumb()
            }
            JointControl::ThumbMiddle => self.set_euler(self.thumb_middle, |e| {
                e.x = -radians;
                e.z = -radians;
            }),
            JointControl::Finger(digit, knuckle) => {
                self.set_euler(self.finger_joint(digit, knuckle), |e| e.x = -radians)
            }
            JointControl::FingersSpread => {
                self.thumb_spread_z = radians * 1.5;
                for digit in Digit::ALL {
                    let knuckle = self.finger_joint(digit, Knuckle::Joint3);
                    self.set_euler(knuckle, |e| e.z = radians * digit.spread_factor())?;
                }
                self.update_thumb()
            }
        }
    }

    /// The thumb's pivot sums its own joint angles and the spread of the whole
    /// hand; recomputed whenever either changes.
    fn update_thumb(&mut self) -> Result<(), HierarchyError> {
        let rotation = self.thumb_rotation();
        self.set_euler(self.thumb, |e| {
            e.x = rotation.x;
            e.z = rotation.z;
        })
    }

    fn set_euler(&mut self, node: NodeIndex, update: impl FnOnce(&mut Vec3)) -> Result<(), HierarchyError> {
        let node = self.tree.node_mut(node)?;
        let mut angles = match node.rotation {
            Rotation::Euler(angles) => angles,
            Rotation::Axis { .. } => Vec3::ZERO,
        };
        update(&mut angles);
        node.rotation = Rotation::Euler(angles);
        Ok(())
    }
}

/// Offset that puts the bottom of a scaled unit cylinder (spanning y -1..1)
/// on its pivot.
fn lifted(scale: Vec3) -> Vec3 {
    Vec3::new(0.0, scale.y, 0.0)
}

fn attach_segment(
    tree: &mut PivotTree,
    segments: &mut Vec<HandSegment>,
    pivot: NodeIndex,
    label: String,
    offset: Vec3,
    scale: Vec3,
) -> Result<(), HierarchyError> {
    let node = tree.add_child(pivot, label, PivotConvention::AttachAtTip { offset, scale })?;
    segments.push(HandSegment {
        node,
        part: PartId::HAND,
    });
    Ok(())
}
