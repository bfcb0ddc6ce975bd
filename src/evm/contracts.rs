//! Rollup portal contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the portals,
//! the input box, the dApp address relay and the token standards they pull
//! from.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    // ========================================================================
    // Portals
    // ========================================================================

    /// Native coin portal
    #[sol(rpc)]
    contract EtherPortal {
        /// Transfer msg.value to the dApp and add an input describing it
        function depositEther(address _dapp, bytes calldata _execLayerData) external payable;
    }

    /// ERC20 portal (pulls tokens with transferFrom, needs an allowance)
    #[sol(rpc)]
    contract ERC20Portal {
        function depositERC20Tokens(
            address _token,
            address _dapp,
            uint256 _amount,
            bytes calldata _execLayerData
        ) external;
    }

    /// ERC721 portal (pulls the token with safeTransferFrom, needs an approval)
    #[sol(rpc)]
    contract ERC721Portal {
        function depositERC721Token(
            address _token,
            address _dapp,
            uint256 _tokenId,
            bytes calldata _baseLayerData,
            bytes calldata _execLayerData
        ) external;
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Generic input channel
    #[sol(rpc)]
    contract InputBox {
        function addInput(address _dapp, bytes calldata _input) external returns (bytes32);
    }

    /// Lets a dApp learn its own address through an input
    #[sol(rpc)]
    contract DAppAddressRelay {
        function relayDAppAddress(address _dapp) external;
    }

    // ========================================================================
    // Token Standards
    // ========================================================================

    /// Standard ERC20 interface
    #[sol(rpc)]
    contract ERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);

        event Approval(address indexed owner, address indexed spender, uint256 value);
    }

    /// Standard ERC721 interface (approval subset)
    #[sol(rpc)]
    contract ERC721 {
        function getApproved(uint256 tokenId) external view returns (address);
        function approve(address to, uint256 tokenId) external;

        event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
    }
}
