pub mod ai_filling;
pub mod common;
pub mod mock_api;
pub mod notification;
pub mod scene;

pub use ai_filling::{ai_filling, AiFillingRequest, AiFillingResponse};
pub use common::{ListOrder, ListParams};
pub use mock_api::{
    create_mock_api, delete_mock_api, get_mock_api, list_mock_apis, list_mock_apis_with_scene,
    select_scene, update_mock_api, CreateMockApiRequest, MockApiResponse,
    MockApiWithSceneResponse, SelectSceneRequest, UpdateMockApiRequest,
};
pub use notification::notification_socket;
pub use scene::{
    create_scene, delete_scene, get_scene, list_scenes, update_scene, CreateSceneRequest,
    SceneListResponse, SceneResponse, UpdateSceneRequest,
};
