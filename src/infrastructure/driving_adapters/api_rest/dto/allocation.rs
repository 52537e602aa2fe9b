//! Allocation DTOs
//!
//! Data transfer objects for the allocation API endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::use_cases::allocations::{ActivePage, DEFAULT_PAGE_SIZE};
use crate::domain::models::allocation::{
    AllocateCidrData, NetworkAllocation, NetworkId, OverlapReport, PageCursor, RegisterCidrData,
};
use crate::domain::models::cidr::CidrBlock;
use crate::shared::errors::DomainError;

/// Validates a network id with the same rules the domain applies
fn validate_network_id(network_id: &str) -> Result<(), validator::ValidationError> {
    NetworkId::try_from(network_id).map(|_| ()).map_err(|_| {
        let mut error = validator::ValidationError::new("network_id");
        error.message = Some(
            "networkId must be 1 to 128 characters of letters, digits, '.', '_', ':' or '-', starting with a letter or digit"
                .into(),
        );
        error
    })
}

/// Validates canonical IPv4 CIDR notation
fn validate_cidr_block(cidr_block: &str) -> Result<(), validator::ValidationError> {
    cidr_block.parse::<CidrBlock>().map(|_| ()).map_err(|e| {
        let mut error = validator::ValidationError::new("cidr_block");
        error.message = Some(e.to_string().into());
        error
    })
}

/// Validates every entry of a CIDR list
fn validate_cidr_list(cidr_blocks: &[String]) -> Result<(), validator::ValidationError> {
    cidr_blocks.iter().try_for_each(|c| validate_cidr_block(c))
}

/// DTO for allocating a block from the pool
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AllocateCidrDto {
    #[validate(custom(function = "validate_network_id"))]
    pub network_id: String,

    #[validate(range(min = 1, max = 32, message = "prefixLength must be between 1 and 32"))]
    pub prefix_length: u32,

    #[validate(length(min = 1, max = 255, message = "name must be between 1 and 255 characters"))]
    pub name: Option<String>,
}

impl TryFrom<AllocateCidrDto> for AllocateCidrData {
    type Error = DomainError;

    fn try_from(dto: AllocateCidrDto) -> Result<Self, Self::Error> {
        let prefix_len = u8::try_from(dto.prefix_length).map_err(|_| DomainError::PrefixOutOfBounds {
            requested: u8::MAX,
            min: 1,
            max: 32,
        })?;

        Ok(Self {
            network_id: NetworkId::try_from(dto.network_id)?,
            prefix_len,
            name: dto.name,
        })
    }
}

/// DTO for registering a block a network already uses
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCidrDto {
    #[validate(custom(function = "validate_network_id"))]
    pub network_id: String,

    #[validate(custom(function = "validate_cidr_block"))]
    pub cidr_block: String,

    #[validate(length(min = 1, max = 255, message = "name must be between 1 and 255 characters"))]
    pub name: Option<String>,
}

impl TryFrom<RegisterCidrDto> for RegisterCidrData {
    type Error = DomainError;

    fn try_from(dto: RegisterCidrDto) -> Result<Self, Self::Error> {
        Ok(Self {
            network_id: NetworkId::try_from(dto.network_id)?,
            cidr_block: dto.cidr_block.parse()?,
            name: dto.name,
        })
    }
}

/// DTO for checking candidate blocks against the registry
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckOverlapsDto {
    #[validate(length(min = 1, max = 100, message = "cidrBlocks must contain between 1 and 100 blocks"))]
    #[validate(custom(function = "validate_cidr_list"))]
    pub cidr_blocks: Vec<String>,
}

impl CheckOverlapsDto {
    /// Parse the candidates, in request order
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCidr` for the first malformed block.
    pub fn to_blocks(&self) -> Result<Vec<CidrBlock>, DomainError> {
        self.cidr_blocks.iter().map(|c| c.parse()).collect()
    }
}

/// Query string for listing active allocations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAllocationsQuery {
    pub after: Option<String>,
    pub limit: Option<u32>,
}

impl ListAllocationsQuery {
    /// Decoded cursor, if one was given
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCursor` if `after` is malformed.
    pub fn cursor(&self) -> Result<Option<PageCursor>, DomainError> {
        self.after
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(PageCursor::decode)
            .transpose()
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// Allocation response DTO
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponseDto {
    pub id: String,
    pub network_id: String,
    pub cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: String,
    pub allocated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
}

impl From<&NetworkAllocation> for AllocationResponseDto {
    fn from(allocation: &NetworkAllocation) -> Self {
        Self {
            id: allocation.id().to_string(),
            network_id: allocation.network_id().to_string(),
            cidr_block: allocation.cidr_block().to_string(),
            name: allocation.name().map(ToString::to_string),
            status: allocation.status().to_string(),
            allocated_at: allocation.allocated_at(),
            released_at: allocation.released_at(),
        }
    }
}

impl From<NetworkAllocation> for AllocationResponseDto {
    fn from(allocation: NetworkAllocation) -> Self {
        Self::from(&allocation)
    }
}

/// One page of active allocations
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPageDto {
    pub items: Vec<AllocationResponseDto>,
    pub next_cursor: Option<String>,
}

impl From<ActivePage> for AllocationPageDto {
    fn from(page: ActivePage) -> Self {
        Self {
            items: page.items.iter().map(AllocationResponseDto::from).collect(),
            next_cursor: page.next_cursor.as_ref().map(PageCursor::encode),
        }
    }
}

/// Overlap report for one candidate block
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapReportDto {
    pub cidr_block: String,
    pub overlaps: bool,
    pub conflicts: Vec<AllocationResponseDto>,
}

impl From<OverlapReport> for OverlapReportDto {
    fn from(report: OverlapReport) -> Self {
        Self {
            cidr_block: report.cidr_block.to_string(),
            overlaps: report.has_overlap(),
            conflicts: report.conflicts.iter().map(AllocationResponseDto::from).collect(),
        }
    }
}
