//! Request/response DTOs for the REST API.

pub mod business_dto;
pub mod common_dto;
pub mod conversation_dto;
pub mod geocoding_dto;
pub mod location_dto;

pub use business_dto::{
    BusinessDocumentDto, BusinessListResponse, BusinessSyncRequest, BusinessSyncResponse,
};
pub use common_dto::{PaginationMeta, PaginationParams};
pub use conversation_dto::{
    ConversationListResponse, CreateConversationRequest, CreateConversationResponse,
    JoinRequestBody, RespondBody, SendMessageBody,
};
pub use geocoding_dto::{DirectionsParams, SearchParams, SearchResponseDto};
pub use location_dto::{GeofenceEnterRequest, LocationUpdateRequest};
