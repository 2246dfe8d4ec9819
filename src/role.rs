// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{convert::Conversion, error::Error, stream::PixelFormat};
use core::fmt;
use std::str::FromStr;

/// Physical sensor channels exposed by the capture device.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Depth,
    Infrared,
    Color,
}

impl ChannelKind {
    /// Bring-up order: color before depth so the depth channel can align to
    /// it, infrared last.
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Color, ChannelKind::Depth, ChannelKind::Infrared];

    /// Bytes per pixel of the channel's native frames.
    pub const fn native_bytes_per_pixel(self) -> usize {
        match self {
            ChannelKind::Depth | ChannelKind::Infrared => 2,
            ChannelKind::Color => 3,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelKind::Depth => f.write_str("depth"),
            ChannelKind::Infrared => f.write_str("infrared"),
            ChannelKind::Color => f.write_str("color"),
        }
    }
}

/// Set of channels that must be enabled on the device.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelSet {
    pub depth: bool,
    pub infrared: bool,
    pub color: bool,
}

impl ChannelSet {
    pub const NONE: ChannelSet = ChannelSet {
        depth: false,
        infrared: false,
        color: false,
    };

    pub const fn contains(&self, kind: ChannelKind) -> bool {
        match kind {
            ChannelKind::Depth => self.depth,
            ChannelKind::Infrared => self.infrared,
            ChannelKind::Color => self.color,
        }
    }

    pub const fn union(self, other: ChannelSet) -> ChannelSet {
        ChannelSet {
            depth: self.depth || other.depth,
            infrared: self.infrared || other.infrared,
            color: self.color || other.color,
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enabled channels in bring-up order.
    pub fn iter(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        ChannelKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

/// Semantic purpose of one capture slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SensorRole {
    #[default]
    Unassigned,
    /// Depth map in the depth sensor's own viewpoint
    Depth,
    /// Depth map registered to the color sensor's viewpoint
    DepthRegisteredToColor,
    Infrared16,
    Infrared8,
    /// 16-bit infrared with the depth channel running for projection
    Infrared16Projective,
    /// 8-bit infrared with the depth channel running for projection
    Infrared8Projective,
    Color,
}

/// Everything the multiplexer needs to know about an active role.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoleSpec {
    /// Format written into the packed frame buffer
    pub format: PixelFormat,
    /// Channel whose frames feed this slot
    pub source: ChannelKind,
    /// Channels that must be enabled, including `source`
    pub channels: ChannelSet,
    pub conversion: Conversion,
}

const fn spec(
    format: PixelFormat,
    source: ChannelKind,
    channels: ChannelSet,
    conversion: Conversion,
) -> Option<RoleSpec> {
    Some(RoleSpec {
        format,
        source,
        channels,
        conversion,
    })
}

const DEPTH: ChannelSet = ChannelSet {
    depth: true,
    ..ChannelSet::NONE
};
const INFRARED: ChannelSet = ChannelSet {
    infrared: true,
    ..ChannelSet::NONE
};
const PROJECTIVE: ChannelSet = ChannelSet {
    depth: true,
    infrared: true,
    ..ChannelSet::NONE
};
const COLOR: ChannelSet = ChannelSet {
    color: true,
    ..ChannelSet::NONE
};

impl SensorRole {
    pub const ALL: [SensorRole; 8] = [
        SensorRole::Unassigned,
        SensorRole::Depth,
        SensorRole::DepthRegisteredToColor,
        SensorRole::Infrared16,
        SensorRole::Infrared8,
        SensorRole::Infrared16Projective,
        SensorRole::Infrared8Projective,
        SensorRole::Color,
    ];

    /// Role to output format and channel mapping, `None` for
    /// [`SensorRole::Unassigned`].
    pub const fn spec(self) -> Option<RoleSpec> {
        use ChannelKind as K;
        use Conversion as C;
        use PixelFormat as F;

        match self {
            SensorRole::Unassigned => None,
            SensorRole::Depth => spec(F::Gray16LE, K::Depth, DEPTH, C::Identity),
            SensorRole::DepthRegisteredToColor => spec(F::Gray16LE, K::Depth, DEPTH, C::Identity),
            SensorRole::Infrared16 => spec(F::Gray16LE, K::Infrared, INFRARED, C::Identity),
            SensorRole::Infrared8 => spec(F::Gray8, K::Infrared, INFRARED, C::Gray16To8),
            SensorRole::Infrared16Projective => {
                spec(F::Gray16LE, K::Infrared, PROJECTIVE, C::Identity)
            }
            SensorRole::Infrared8Projective => {
                spec(F::Gray8, K::Infrared, PROJECTIVE, C::Gray16To8)
            }
            SensorRole::Color => spec(F::RGB24, K::Color, COLOR, C::Identity),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SensorRole::Unassigned => "none",
            SensorRole::Depth => "depth",
            SensorRole::DepthRegisteredToColor => "depth-reg",
            SensorRole::Infrared16 => "ir",
            SensorRole::Infrared8 => "ir8",
            SensorRole::Infrared16Projective => "ir-proj",
            SensorRole::Infrared8Projective => "ir8-proj",
            SensorRole::Color => "rgb",
        }
    }
}

impl fmt::Display for SensorRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        SensorRole::ALL
            .into_iter()
            .find(|role| role.name() == name)
            .ok_or_else(|| Error::UnsupportedRole(s.to_string()))
    }
}

/// The two capture slots of a multiplexer.
///
/// The device streams at most one depth and one other channel at a time, so
/// the slot count is fixed at two. Either slot may be unassigned.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RolePair {
    pub first: SensorRole,
    pub second: SensorRole,
}

impl RolePair {
    pub const fn new(first: SensorRole, second: SensorRole) -> Self {
        Self { first, second }
    }

    /// Roles in slot order.
    pub const fn slots(&self) -> [SensorRole; 2] {
        [self.first, self.second]
    }

    pub fn contains(&self, role: SensorRole) -> bool {
        self.first == role || self.second == role
    }
}

impl fmt::Display for RolePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.first, self.second)
    }
}

/// An active slot after classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActiveSlot {
    pub slot: usize,
    pub role: SensorRole,
    pub spec: RoleSpec,
}

/// Result of classifying a [`RolePair`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    /// Active slots in slot order; unassigned slots collapse.
    pub slots: Vec<ActiveSlot>,
    /// Union of the channels required by every active slot.
    pub channels: ChannelSet,
    /// Whether the depth channel must be registered to the color viewpoint.
    pub align_depth_to_color: bool,
}

impl Classification {
    pub fn formats(&self) -> impl Iterator<Item = PixelFormat> + '_ {
        self.slots.iter().map(|slot| slot.spec.format)
    }
}

/// Classifies both slots into output formats and required channels.
pub fn classify(roles: RolePair) -> Classification {
    let slots: Vec<ActiveSlot> = roles
        .slots()
        .into_iter()
        .enumerate()
        .filter_map(|(slot, role)| role.spec().map(|spec| ActiveSlot { slot, role, spec }))
        .collect();

    let channels = slots
        .iter()
        .fold(ChannelSet::NONE, |set, slot| set.union(slot.spec.channels));

    Classification {
        slots,
        channels,
        align_depth_to_color: roles.contains(SensorRole::DepthRegisteredToColor)
            && roles.contains(SensorRole::Color),
    }
}
