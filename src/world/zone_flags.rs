use bitflags::bitflags;

bitflags! {
    /// Zone properties of a tile, as stored in the map data.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ZoneFlags: u32 {
        const PROTECTION_ZONE = 1 << 0;
        /// Legacy house marker; houses are tracked through the house table.
        const HOUSE = 1 << 1;
        const NO_PVP = 1 << 2;
        const NO_LOGOUT = 1 << 3;
        const PVP_ZONE = 1 << 4;
        const REFRESH = 1 << 5;
    }
}

impl ZoneFlags {
    /// Builds the flag set from a raw configuration value. Unknown bits are
    /// dropped.
    pub fn from_config(value: u32) -> Self {
        Self::from_bits_truncate(value)
    }

    pub fn is_protection_zone(self) -> bool {
        self.contains(Self::PROTECTION_ZONE)
    }

    pub fn is_no_logout(self) -> bool {
        self.contains(Self::NO_LOGOUT)
    }

    pub fn is_no_pvp(self) -> bool {
        self.contains(Self::NO_PVP)
    }

    pub fn is_pvp_zone(self) -> bool {
        self.contains(Self::PVP_ZONE)
    }

    pub fn is_refresh(self) -> bool {
        self.contains(Self::REFRESH)
    }
}
